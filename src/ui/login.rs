use std::rc::Rc;

use adw::prelude::*;
use gtk4 as gtk;

use crate::api::identity::{GoogleIdentity, IdentityProvider, LinkedInIdentity, LocalIdentity};
use crate::error::AuthError;
use crate::register::SignUpForm;
use crate::session::View;
use crate::ui::main_window::Ui;

const COUNTRY_CODES: [&str; 6] = ["+1", "+44", "+49", "+33", "+91", "+61"];

/// The sign-in and sign-up pages of the window's stack.
pub struct AuthForms {
    pub signin: gtk::Widget,
    pub signup: gtk::Widget,
}

impl AuthForms {
    pub fn new(ui: &Rc<Ui>) -> Self {
        Self {
            signin: signin_page(ui),
            signup: signup_page(ui),
        }
    }
}

fn page(title: &str) -> gtk::Box {
    let root = gtk::Box::new(gtk::Orientation::Vertical, 12);
    root.set_margin_top(24);
    root.set_margin_bottom(24);
    root.set_margin_start(24);
    root.set_margin_end(24);
    root.set_valign(gtk::Align::Center);

    let title = gtk::Label::new(Some(title));
    title.add_css_class("title-2");
    title.set_halign(gtk::Align::Start);
    root.append(&title);
    root
}

fn entry(placeholder: &str) -> gtk::Entry {
    let entry = gtk::Entry::new();
    entry.set_placeholder_text(Some(placeholder));
    entry.set_hexpand(true);
    entry
}

fn password(placeholder: &str) -> gtk::PasswordEntry {
    let entry = gtk::PasswordEntry::new();
    entry.set_placeholder_text(Some(placeholder));
    entry.set_hexpand(true);
    entry
}

fn signin_page(ui: &Rc<Ui>) -> gtk::Widget {
    let root = page("Sign In");

    let email_entry = entry("Email");
    let pass_entry = password("Password");
    let form = gtk::Box::new(gtk::Orientation::Vertical, 8);
    form.append(&email_entry);
    form.append(&pass_entry);
    root.append(&form);

    let signin_btn = gtk::Button::with_label("Sign In");
    signin_btn.add_css_class("suggested-action");
    signin_btn.set_halign(gtk::Align::End);
    root.append(&signin_btn);

    // Third-party sign-in
    let providers = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    providers.set_halign(gtk::Align::Center);
    let google_btn = gtk::Button::with_label("Sign in with Google");
    let linkedin_btn = gtk::Button::with_label("Sign in with LinkedIn");
    providers.append(&google_btn);
    providers.append(&linkedin_btn);
    root.append(&providers);

    let show_signup = gtk::Button::with_label("Don't have an account? Sign up");
    show_signup.add_css_class("flat");
    root.append(&show_signup);

    let on_signin: Rc<dyn Fn()> = {
        let ui = ui.clone();
        let email_entry = email_entry.clone();
        let pass_entry = pass_entry.clone();
        Rc::new(move || {
            let local = LocalIdentity::new(&email_entry.text(), &pass_entry.text());
            match local.authenticate() {
                Ok(identity) => {
                    log::info!("sign in submitted for {}", email_entry.text().trim());
                    pass_entry.set_text("");
                    ui.signed_in(identity);
                }
                Err(_) => ui.toast("Please enter your email and password."),
            }
        })
    };
    {
        let on_signin = on_signin.clone();
        signin_btn.connect_clicked(move |_| (on_signin)());
    }
    {
        let on_signin = on_signin.clone();
        email_entry.connect_activate(move |_| (on_signin)());
    }
    {
        let on_signin = on_signin.clone();
        pass_entry.connect_activate(move |_| (on_signin)());
    }

    {
        let ui = ui.clone();
        show_signup.connect_clicked(move |_| ui.show_view(View::SignUp));
    }
    {
        let ui = ui.clone();
        google_btn.connect_clicked(move |_| google_dialog(&ui));
    }
    {
        let ui = ui.clone();
        linkedin_btn.connect_clicked(move |_| {
            let window = ui.window.clone();
            let provider = LinkedInIdentity::new(
                &ui.settings.linkedin_client_id,
                &ui.settings.linkedin_redirect_uri,
                move |url: &url::Url| -> Result<(), AuthError> {
                    #[allow(deprecated)]
                    gtk::show_uri(Some(&window), url.as_str(), 0);
                    Ok(())
                },
            );
            match provider.authenticate() {
                Ok(identity) => ui.signed_in(identity),
                Err(e) => ui.toast(&format!("LinkedIn sign-in failed: {}", e)),
            }
        });
    }

    root.upcast()
}

/// Asks for the ID token the Google client hands back and signs in with it.
fn google_dialog(ui: &Rc<Ui>) {
    let dialog = gtk::Dialog::builder()
        .title("Sign in with Google")
        .transient_for(&ui.window)
        .modal(true)
        .build();
    let content = gtk::Box::new(gtk::Orientation::Vertical, 12);
    content.set_margin_top(12);
    content.set_margin_bottom(12);
    content.set_margin_start(12);
    content.set_margin_end(12);

    let info = gtk::Label::new(Some("Paste the credential returned by Google:"));
    info.set_halign(gtk::Align::Start);
    content.append(&info);
    let token_entry = entry("ID token");
    content.append(&token_entry);

    dialog.set_child(Some(&content));
    let _ = dialog.add_button("Cancel", gtk::ResponseType::Cancel);
    let ok_btn = dialog.add_button("Sign In", gtk::ResponseType::Ok);
    ok_btn.add_css_class("suggested-action");
    dialog.set_default_response(gtk::ResponseType::Ok);

    let ui = ui.clone();
    dialog.connect_response(move |dlg, resp| {
        if resp == gtk::ResponseType::Ok {
            let provider = GoogleIdentity::new(&ui.settings.google_client_id)
                .with_credential(&token_entry.text());
            match provider.authenticate() {
                Ok(identity) => ui.signed_in(identity),
                Err(e) => {
                    log::warn!("Google sign-in rejected: {}", e);
                    ui.toast(&format!("Google sign-in failed: {}", e));
                }
            }
        }
        dlg.close();
    });
    dialog.present();
}

fn signup_page(ui: &Rc<Ui>) -> gtk::Widget {
    let root = page("Create Account");

    let first_entry = entry("First name");
    let last_entry = entry("Last name");
    let email_entry = entry("Email");
    let country = gtk::DropDown::from_strings(&COUNTRY_CODES);
    let phone_entry = entry("Phone number");
    let pass_entry = password("Password");
    let confirm_entry = password("Confirm password");

    let names = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    names.append(&first_entry);
    names.append(&last_entry);
    let phone_row = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    phone_row.append(&country);
    phone_row.append(&phone_entry);

    let form = gtk::Box::new(gtk::Orientation::Vertical, 8);
    form.append(&names);
    form.append(&email_entry);
    form.append(&phone_row);
    form.append(&pass_entry);
    form.append(&confirm_entry);
    root.append(&form);

    let signup_btn = gtk::Button::with_label("Sign Up");
    signup_btn.add_css_class("suggested-action");
    signup_btn.set_halign(gtk::Align::End);
    root.append(&signup_btn);

    let show_signin = gtk::Button::with_label("Already have an account? Sign in");
    show_signin.add_css_class("flat");
    root.append(&show_signin);

    {
        let ui = ui.clone();
        show_signin.connect_clicked(move |_| ui.show_view(View::SignIn));
    }

    {
        let ui = ui.clone();
        signup_btn.connect_clicked(move |_| {
            let code = COUNTRY_CODES
                .get(country.selected() as usize)
                .copied()
                .unwrap_or_default();
            let form = SignUpForm {
                firstname: first_entry.text().to_string(),
                lastname: last_entry.text().to_string(),
                email: email_entry.text().trim().to_string(),
                phone_number: SignUpForm::phone(code, &phone_entry.text()),
                password: pass_entry.text().to_string(),
                confirm_password: confirm_entry.text().to_string(),
            };
            if let Err(e) = form.validate() {
                ui.toast(&e.to_string());
                return;
            }
            log::info!("sign up submitted for {}", form.email);

            let mut identity = LocalIdentity::new(&form.email, &form.password).authenticate().ok();
            pass_entry.set_text("");
            confirm_entry.set_text("");

            let client = ui.client.clone();
            let register_url = ui.settings.register_url.clone();
            let rx = crate::utils::run_async_to_main(async move {
                client.register(&register_url, &form).await
            });
            let ui = ui.clone();
            rx.attach(None, move |res| {
                match res {
                    Ok(message) => {
                        let opened = match identity.take() {
                            Some(identity) => ui.session.borrow_mut().finish_sign_up(identity, &message),
                            None => false,
                        };
                        if opened {
                            ui.render();
                        }
                        ui.toast(&message);
                    }
                    Err(err) => {
                        log::warn!("registration request failed: {}", err);
                        ui.toast("Could not reach the registration service.");
                    }
                }
                glib::ControlFlow::Break
            });
        });
    }

    root.upcast()
}
