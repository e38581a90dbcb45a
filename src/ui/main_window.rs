use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use adw::Application;
use adw::prelude::*;
use gtk4 as gtk;

use crate::api::client::{ApiClient, CompletionService};
use crate::api::identity::Identity;
use crate::app::Settings;
use crate::session::{Session, View};
use crate::typing::{Reveal, RevealTasks};
use crate::ui::chat_view::ChatView;

/// Everything the window's callbacks share. Lives on the GTK main thread.
pub struct Ui {
    pub session: RefCell<Session>,
    pub settings: Settings,
    pub client: Arc<ApiClient>,
    pub reveals: Arc<RevealTasks>,
    pub window: adw::ApplicationWindow,
    overlay: adw::ToastOverlay,
    stack: gtk::Stack,
    chat: ChatView,
    logout_btn: gtk::Button,
}

impl Ui {
    /// Projects the session onto the widgets.
    pub fn render(&self) {
        let session = self.session.borrow();
        self.stack.set_visible_child_name(session.view().name());
        self.logout_btn.set_visible(session.is_visible(View::Chat));
        self.chat.render(&session);
    }

    pub fn show_view(&self, view: View) {
        self.session.borrow_mut().show_view(view);
        self.render();
    }

    pub fn signed_in(&self, identity: Identity) {
        self.session.borrow_mut().sign_in(identity);
        self.render();
    }

    pub fn toast(&self, message: &str) {
        self.overlay.add_toast(adw::Toast::new(message));
    }

    fn logout(&self) {
        let stopped = self.reveals.cancel_all();
        let provider = self.session.borrow().identity().map(|i| i.provider);
        log::info!("logging out {:?} user, {} reveal(s) stopped", provider, stopped);
        self.chat.clear_input();
        self.session.borrow_mut().logout();
        self.render();
    }
}

pub fn show_main_window(app: &Application, settings: Settings) {
    let client = match ApiClient::from_settings(&settings) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            log::error!("cannot create HTTP client: {}", e);
            app.quit();
            return;
        }
    };

    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("ChatDesk")
        .default_width(720)
        .default_height(640)
        .build();

    let overlay = adw::ToastOverlay::new();
    let stack = gtk::Stack::builder()
        .transition_type(gtk::StackTransitionType::Crossfade)
        .vexpand(true)
        .build();
    overlay.set_child(Some(&stack));

    let container = gtk::Box::new(gtk::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let title = gtk::Label::new(Some("ChatDesk"));
    header.set_title_widget(Some(&title));
    let logout_btn = gtk::Button::with_label("Log Out");
    header.pack_end(&logout_btn);
    container.append(&header);
    container.append(&overlay);
    window.set_content(Some(&container));

    let chat = ChatView::new();
    stack.add_named(&chat.widget(), Some(View::Chat.name()));

    let ui = Rc::new(Ui {
        session: RefCell::new(Session::new()),
        settings,
        client,
        reveals: Arc::new(RevealTasks::new()),
        window: window.clone(),
        overlay,
        stack: stack.clone(),
        chat,
        logout_btn: logout_btn.clone(),
    });

    let forms = crate::ui::login::AuthForms::new(&ui);
    stack.add_named(&forms.signin, Some(View::SignIn.name()));
    stack.add_named(&forms.signup, Some(View::SignUp.name()));

    {
        let ui = ui.clone();
        logout_btn.connect_clicked(move |_| ui.logout());
    }
    {
        let ui_send = ui.clone();
        ui.chat.send_btn.connect_clicked(move |_| send_message(&ui_send));
        let ui_send = ui.clone();
        ui.chat.entry.connect_activate(move |_| send_message(&ui_send));
    }

    ui.render();
    window.present();
}

fn send_message(ui: &Rc<Ui>) {
    let pending = {
        let mut session = ui.session.borrow_mut();
        session.set_input(&ui.chat.entry.text());
        session.submit_user_message()
    };
    let Some(pending) = pending else { return };
    ui.chat.clear_input();
    ui.render();

    let client = ui.client.clone();
    let text = pending.text.clone();
    let rx = crate::utils::run_async_to_main(async move { client.complete(&text).await });

    let ui = ui.clone();
    let mut pending = Some(pending);
    rx.attach(None, move |res| {
        if let Some(pending) = pending.take() {
            let reveal = ui.session.borrow_mut().finish_reply(pending, res);
            if let Some(reveal) = reveal {
                start_reveal(&ui, reveal);
            }
            ui.render();
        }
        glib::ControlFlow::Break
    });
}

fn start_reveal(ui: &Rc<Ui>, reveal: Reveal) {
    let id = reveal.id();
    let quantum = ui.settings.typing_quantum();
    let (tx, rx) = crate::utils::glib_channel::<usize>();

    let rt = crate::utils::RUNTIME.handle();
    if !ui.reveals.spawn(rt, reveal, quantum, move |_, n| tx.send(n).is_ok()) {
        return;
    }

    let ui = ui.clone();
    rx.attach(None, move |n| {
        if ui.session.borrow_mut().advance_reveal(id, n) {
            ui.render();
            glib::ControlFlow::Continue
        } else {
            glib::ControlFlow::Break
        }
    });
}
