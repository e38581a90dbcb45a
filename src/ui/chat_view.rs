use gtk4 as gtk;
use gtk4::prelude::*;

use crate::api::models::Sender;
use crate::session::Session;

pub struct ChatView {
    root: gtk::Box,
    scroller: gtk::ScrolledWindow,
    messages_box: gtk::Box,
    pub entry: gtk::Entry,
    pub send_btn: gtk::Button,
}

impl ChatView {
    pub fn new() -> Self {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);

        let scroller = gtk::ScrolledWindow::builder()
            .vexpand(true)
            .hexpand(true)
            .build();
        let messages_box = gtk::Box::new(gtk::Orientation::Vertical, 6);
        scroller.set_child(Some(&messages_box));
        root.append(&scroller);

        // Input row
        let input_row = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        let entry = gtk::Entry::new();
        entry.set_hexpand(true);
        entry.set_placeholder_text(Some("Type a message…"));
        let send_btn = gtk::Button::with_label("Send");
        send_btn.add_css_class("suggested-action");
        input_row.append(&entry);
        input_row.append(&send_btn);
        root.append(&input_row);

        Self { root, scroller, messages_box, entry, send_btn }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    /// Redraws the transcript and keeps the newest line in view.
    pub fn render(&self, session: &Session) {
        while let Some(child) = self.messages_box.first_child() {
            self.messages_box.remove(&child);
        }
        for msg in session.transcript() {
            let lbl = gtk::Label::new(Some(&msg.display_line()));
            lbl.set_wrap(true);
            lbl.set_xalign(0.0);
            lbl.set_selectable(msg.is_fully_rendered());
            match msg.sender {
                Sender::User => lbl.set_halign(gtk::Align::End),
                Sender::Assistant => lbl.set_halign(gtk::Align::Start),
                Sender::System => {
                    lbl.set_halign(gtk::Align::Start);
                    lbl.add_css_class("dim-label");
                }
            }
            self.messages_box.append(&lbl);
        }
        let adj = self.scroller.vadjustment();
        adj.set_value(adj.upper());
    }

    pub fn clear_input(&self) {
        self.entry.set_text("");
    }
}
