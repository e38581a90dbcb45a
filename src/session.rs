//! What the window shows: the current view, the transcript and the input
//! buffer. The UI only renders [`Session::lines`] and forwards user actions.

use crate::api::identity::Identity;
use crate::api::models::{Message, MessageId, Sender};
use crate::error::ChatError;
use crate::register::MSG_OK;
use crate::typing::Reveal;

pub const TYPING_PLACEHOLDER: &str = "Assistant is typing...";
pub const FETCH_ERROR: &str = "Error: Unable to fetch response from server.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    SignIn,
    SignUp,
    Chat,
}

impl View {
    pub const ALL: [View; 3] = [View::SignIn, View::SignUp, View::Chat];

    pub fn name(self) -> &'static str {
        match self {
            View::SignIn => "signin",
            View::SignUp => "signup",
            View::Chat => "chat",
        }
    }
}

/// A submitted message waiting for its reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    pub text: String,
    pub placeholder: MessageId,
    epoch: u64,
}

#[derive(Debug, Default)]
pub struct Session {
    view: View,
    transcript: Vec<Message>,
    input: String,
    identity: Option<Identity>,
    next_id: MessageId,
    epoch: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn show_view(&mut self, view: View) {
        log::debug!("view {} -> {}", self.view.name(), view.name());
        self.view = view;
    }

    pub fn is_visible(&self, view: View) -> bool {
        self.view == view
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Records who signed in and opens the chat.
    pub fn sign_in(&mut self, identity: Identity) {
        log::info!("signed in via {:?}", identity.provider);
        self.identity = Some(identity);
        self.show_view(View::Chat);
    }

    /// Applies the registration service's answer to a sign-up. Only a
    /// successful registration opens the chat; any other answer leaves the
    /// sign-up form in place.
    pub fn finish_sign_up(&mut self, identity: Identity, answer: &str) -> bool {
        if answer.trim() != MSG_OK {
            log::info!("sign up refused: {}", answer.trim());
            return false;
        }
        self.sign_in(identity);
        true
    }

    /// Clears everything and returns to the sign-in form. Replies still in
    /// flight are dropped when they arrive.
    pub fn logout(&mut self) {
        self.transcript.clear();
        self.input.clear();
        self.identity = None;
        self.epoch += 1;
        self.show_view(View::SignIn);
    }

    fn push(&mut self, sender: Sender, text: &str, revealed: bool) -> MessageId {
        let id = self.next_id;
        self.next_id += 1;
        let msg = if revealed {
            Message::revealed(id, sender, text)
        } else {
            Message::hidden(id, sender, text)
        };
        self.transcript.push(msg);
        id
    }

    fn remove(&mut self, id: MessageId) {
        self.transcript.retain(|m| m.id != id);
    }

    /// Takes the input buffer as a new user message. Returns `None`, and
    /// changes nothing, when the trimmed input is empty.
    pub fn submit_user_message(&mut self) -> Option<PendingReply> {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return None;
        }
        self.push(Sender::User, &text, true);
        self.input.clear();
        let placeholder = self.push(Sender::System, TYPING_PLACEHOLDER, true);
        Some(PendingReply { text, placeholder, epoch: self.epoch })
    }

    /// Replaces the placeholder of `pending` with the outcome. A reply yields
    /// an unrevealed assistant message and the [`Reveal`] that uncovers it.
    pub fn finish_reply(
        &mut self,
        pending: PendingReply,
        result: Result<String, ChatError>,
    ) -> Option<Reveal> {
        if pending.epoch != self.epoch {
            log::debug!("dropping reply for a closed session");
            return None;
        }
        self.remove(pending.placeholder);
        match result {
            Ok(reply) => {
                let id = self.push(Sender::Assistant, &reply, false);
                Some(Reveal::new(id, reply.chars().count()))
            }
            Err(err) => {
                log::warn!("completion failed: {}", err);
                self.push(Sender::System, FETCH_ERROR, true);
                None
            }
        }
    }

    /// Applies one reveal step. Returns `false` once the message is gone.
    pub fn advance_reveal(&mut self, id: MessageId, revealed: usize) -> bool {
        match self.transcript.iter_mut().find(|m| m.id == id) {
            Some(msg) => {
                msg.reveal_to(revealed);
                true
            }
            None => false,
        }
    }

    /// The transcript as display lines.
    pub fn lines(&self) -> Vec<String> {
        self.transcript.iter().map(Message::display_line).collect()
    }
}
