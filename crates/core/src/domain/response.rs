use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub const ENVELOPE_VERSION: &str = "1.0";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum OutputSpeech {
    PlainText { text: String },
    #[serde(rename = "SSML")]
    Ssml { ssml: String },
}

impl OutputSpeech {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::PlainText { text: text.into() }
    }

    pub fn ssml(markup: impl Into<String>) -> Self {
        Self::Ssml { ssml: markup.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::PlainText { text } => text,
            Self::Ssml { ssml } => ssml,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Card {
    #[serde(rename = "type")]
    pub card_type: &'static str,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub content: String,
}

pub fn simple_card(title: impl Into<String>, content: impl Into<String>) -> Card {
    Card { card_type: "Simple", title: title.into(), subtitle: None, content: content.into() }
}

/// Spoken reply produced by a handler, before it is wrapped for the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpeechResponse {
    pub speech: OutputSpeech,
    pub card: Option<Card>,
    pub reprompt: Option<OutputSpeech>,
    pub end_session: bool,
}

impl SpeechResponse {
    pub fn speech_text(&self) -> &str {
        self.speech.text()
    }

    pub fn into_envelope(self, session_attributes: Map<String, Value>) -> ResponseEnvelope {
        ResponseEnvelope {
            version: ENVELOPE_VERSION,
            session_attributes,
            response: ResponseBody {
                output_speech: self.speech,
                card: self.card,
                reprompt: self.reprompt.map(|output_speech| Reprompt { output_speech }),
                should_end_session: self.end_session,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub version: &'static str,
    pub session_attributes: Map<String, Value>,
    pub response: ResponseBody,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    pub output_speech: OutputSpeech,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<Reprompt>,
    pub should_end_session: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reprompt {
    pub output_speech: OutputSpeech,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResponseError {
    #[error("spoken response text must not be empty")]
    EmptySpeech,
}

pub struct ResponseBuilder {
    speech: OutputSpeech,
    card: Option<Card>,
    reprompt: Option<OutputSpeech>,
    end_session: bool,
}

impl ResponseBuilder {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_speech(OutputSpeech::plain(text))
    }

    pub fn ssml(markup: impl Into<String>) -> Self {
        Self::with_speech(OutputSpeech::ssml(markup))
    }

    fn with_speech(speech: OutputSpeech) -> Self {
        Self { speech, card: None, reprompt: None, end_session: false }
    }

    pub fn card(mut self, title: impl Into<String>, content: impl Into<String>) -> Self {
        self.card = Some(simple_card(title, content));
        self
    }

    pub fn card_with_subtitle(
        mut self,
        title: impl Into<String>,
        subtitle: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let mut card = simple_card(title, content);
        card.subtitle = Some(subtitle.into());
        self.card = Some(card);
        self
    }

    pub fn reprompt(mut self, text: impl Into<String>) -> Self {
        self.reprompt = Some(OutputSpeech::plain(text));
        self
    }

    pub fn end_session(mut self, end_session: bool) -> Self {
        self.end_session = end_session;
        self
    }

    pub fn build(self) -> Result<SpeechResponse, ResponseError> {
        if self.speech.text().trim().is_empty() {
            return Err(ResponseError::EmptySpeech);
        }

        Ok(SpeechResponse {
            speech: self.speech,
            card: self.card,
            reprompt: self.reprompt,
            end_session: self.end_session,
        })
    }
}
