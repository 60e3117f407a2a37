//! Transcript entries for the chat front end.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::models::{Opportunity, UserProfile};

pub const ANALYZED_REPLY: &str = "I've analyzed that for you.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// Whether a message carries an assembled opportunity is fixed when it is built.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    Plain(String),
    WithOpportunity {
        text: String,
        opportunity: Box<Opportunity>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub body: MessageBody,
}

impl ChatMessage {
    fn new(sender: Sender, body: MessageBody) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender,
            timestamp: Utc::now(),
            body,
        }
    }

    pub fn welcome(profile: &UserProfile) -> Self {
        Self::new(
            Sender::Bot,
            MessageBody::Plain(format!(
                "Hi {}! I'm your OppTracker agent.\n\n\
                Forward me job links or paste descriptions here. \
                I'll vet them for scams and check if they match your profile.",
                profile.first_name()
            )),
        )
    }

    pub fn user(text: &str) -> Self {
        Self::new(Sender::User, MessageBody::Plain(text.to_string()))
    }

    /// The bot's answer to one submission. Failures only ever show the generic message.
    pub fn reply(outcome: &Result<Opportunity, PipelineError>) -> Self {
        let body = match outcome {
            Ok(opportunity) => MessageBody::WithOpportunity {
                text: ANALYZED_REPLY.to_string(),
                opportunity: Box::new(opportunity.clone()),
            },
            Err(e) => MessageBody::Plain(e.user_message().to_string()),
        };
        Self::new(Sender::Bot, body)
    }

    pub fn text(&self) -> &str {
        match &self.body {
            MessageBody::Plain(text) => text,
            MessageBody::WithOpportunity { text, .. } => text,
        }
    }

    pub fn opportunity(&self) -> Option<&Opportunity> {
        match &self.body {
            MessageBody::Plain(_) => None,
            MessageBody::WithOpportunity { opportunity, .. } => Some(opportunity.as_ref()),
        }
    }
}
