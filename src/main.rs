use adw::Application;
use adw::prelude::*;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = Application::builder()
        .application_id("com.example.ChatDesk")
        .build();
    app.connect_activate(|app| {
        chatdesk::app::build_ui(app);
    });
    app.run();
}
