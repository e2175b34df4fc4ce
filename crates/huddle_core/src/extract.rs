//! HTML extraction from the conversation.
//!
//! Assistant messages are scanned in order. A message is a candidate when
//! the Software Engineer wrote it or it mentions "html". Each candidate is
//! run through an ordered list of fenced-block rules; the first rule that
//! matches wins, and the first message with a match wins overall.
//!
//! If no candidate matches, a fallback looks for an unfenced
//! `<!DOCTYPE ...</html>` or `<html ...</html>` span in any assistant
//! message.

use huddle_chat::{Message, MessageRole, PersonaKind};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

/// A named, pure extraction step.
#[derive(Clone, Copy)]
pub struct ExtractionRule {
    pub name: &'static str,
    apply: fn(&str) -> Option<String>,
}

impl ExtractionRule {
    pub const fn new(name: &'static str, apply: fn(&str) -> Option<String>) -> Self {
        Self { name, apply }
    }

    /// Run the rule against message text
    pub fn apply(&self, text: &str) -> Option<String> {
        (self.apply)(text)
    }
}

impl std::fmt::Debug for ExtractionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionRule").field("name", &self.name).finish()
    }
}

// Trimmed first capture group; blank captures count as no match.
fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

macro_rules! fenced_rule {
    ($fn_name:ident, $pattern:literal) => {
        fn $fn_name(text: &str) -> Option<String> {
            static RE: Lazy<Regex> =
                Lazy::new(|| Regex::new($pattern).expect("invalid extraction regex"));
            first_capture(&RE, text)
        }
    };
}

fenced_rule!(fenced_html, r"(?is)```html\s*(.*?)```");
fenced_rule!(fenced_html_upper, r"(?is)```HTML\s*(.*?)```");
fenced_rule!(fenced_html_spaced, r"(?is)```\s*html\s*(.*?)```");
fenced_rule!(fenced_doctype, r"(?is)```\s*(<!DOCTYPE html.*?)```");
fenced_rule!(fenced_html_tags, r"(?is)```\s*(<html.*?</html>)```");
fenced_rule!(fenced_closing_tag, r"(?is)```\s*(.*?</html>)\s*```");

fn raw_html(text: &str) -> Option<String> {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?is)(<!DOCTYPE.*?</html>|<html.*?</html>)").expect("invalid extraction regex")
    });
    first_capture(&RE, text)
}

/// Fenced-block rules in the order they are tried.
pub const FENCED_RULES: [ExtractionRule; 6] = [
    ExtractionRule::new("fenced-html", fenced_html),
    ExtractionRule::new("fenced-html-upper", fenced_html_upper),
    ExtractionRule::new("fenced-html-spaced", fenced_html_spaced),
    ExtractionRule::new("fenced-doctype", fenced_doctype),
    ExtractionRule::new("fenced-html-tags", fenced_html_tags),
    ExtractionRule::new("fenced-closing-tag", fenced_closing_tag),
];

/// Markers that make a message worth a fallback scan
const RAW_MARKERS: [&str; 4] = ["<html", "<!doctype", "<head", "<body"];

/// How the HTML was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionSource {
    /// Matched by the named fenced rule
    Fenced(&'static str),
    /// Matched by the unfenced fallback
    Raw,
}

impl std::fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fenced(rule) => write!(f, "{}", rule),
            Self::Raw => write!(f, "raw-html-fallback"),
        }
    }
}

/// The extracted document and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub html: String,
    pub source: ExtractionSource,
    /// Index into the message list
    pub message_index: usize,
}

/// Ordered rule set plus the author treated as the code writer.
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    rules: Vec<ExtractionRule>,
    engineer: String,
}

impl Default for HtmlExtractor {
    fn default() -> Self {
        Self {
            rules: FENCED_RULES.to_vec(),
            engineer: PersonaKind::SoftwareEngineer.agent_name().to_string(),
        }
    }
}

impl HtmlExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule after the built-in ones
    pub fn with_rule(mut self, rule: ExtractionRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[ExtractionRule] {
        &self.rules
    }

    /// Whether a message should be run through the fenced rules
    pub fn is_candidate(&self, message: &Message) -> bool {
        match message.role {
            MessageRole::Assistant => {
                message.author.as_deref() == Some(self.engineer.as_str())
                    || message.content.to_lowercase().contains("html")
            }
            MessageRole::User | MessageRole::System => false,
        }
    }

    /// First HTML document in the conversation, if any
    pub fn extract(&self, messages: &[Message]) -> Option<Extraction> {
        debug!("Searching through {} messages for HTML code", messages.len());

        self.extract_fenced(messages)
            .or_else(|| self.extract_raw(messages))
    }

    fn extract_fenced(&self, messages: &[Message]) -> Option<Extraction> {
        messages
            .iter()
            .enumerate()
            .filter(|(_, m)| self.is_candidate(m))
            .find_map(|(index, message)| {
                debug!(
                    "Checking message {} from {}",
                    index + 1,
                    message.author_or_unknown()
                );
                self.rules.iter().find_map(|rule| {
                    rule.apply(&message.content).map(|html| {
                        info!("Extracted HTML from message {} using {}", index + 1, rule.name);
                        Extraction {
                            html,
                            source: ExtractionSource::Fenced(rule.name),
                            message_index: index,
                        }
                    })
                })
            })
    }

    fn extract_raw(&self, messages: &[Message]) -> Option<Extraction> {
        messages
            .iter()
            .enumerate()
            .filter(|(_, m)| matches!(m.role, MessageRole::Assistant))
            .filter(|(_, m)| {
                let lower = m.content.to_lowercase();
                RAW_MARKERS.iter().any(|marker| lower.contains(marker))
            })
            .find_map(|(index, message)| {
                raw_html(&message.content).map(|html| {
                    info!("Found unfenced HTML in message {}", index + 1);
                    Extraction {
                        html,
                        source: ExtractionSource::Raw,
                        message_index: index,
                    }
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engineer(content: &str) -> Message {
        Message::from_persona("SoftwareEngineer", content)
    }

    fn rule(name: &str) -> ExtractionRule {
        *FENCED_RULES.iter().find(|r| r.name == name).unwrap()
    }

    #[test]
    fn test_simple_fenced_block() {
        let messages = [engineer("```html\n<p>hi</p>\n```")];
        let found = HtmlExtractor::new().extract(&messages).unwrap();
        assert_eq!(found.html, "<p>hi</p>");
        assert_eq!(found.source, ExtractionSource::Fenced("fenced-html"));
        assert_eq!(found.message_index, 0);
    }

    #[test]
    fn test_later_message_wins_when_earlier_has_no_html() {
        let messages = [
            engineer("Let me think about the layout first."),
            engineer("Here it is:\n```html\n<div>app</div>\n```"),
        ];
        let found = HtmlExtractor::new().extract(&messages).unwrap();
        assert_eq!(found.html, "<div>app</div>");
        assert_eq!(found.message_index, 1);
    }

    #[test]
    fn test_earlier_message_takes_precedence() {
        let messages = [
            engineer("```html\n<p>first</p>\n```"),
            engineer("```html\n<p>second</p>\n```"),
        ];
        let found = HtmlExtractor::new().extract(&messages).unwrap();
        assert_eq!(found.html, "<p>first</p>");
    }

    #[test]
    fn test_individual_rules() {
        assert_eq!(
            rule("fenced-html-spaced").apply("``` html\n<b>x</b>\n```").as_deref(),
            Some("<b>x</b>")
        );
        assert_eq!(
            rule("fenced-doctype")
                .apply("```\n<!DOCTYPE html><html></html>\n```")
                .as_deref(),
            Some("<!DOCTYPE html><html></html>")
        );
        assert_eq!(
            rule("fenced-html-tags")
                .apply("```\n<html lang=\"en\"><body></body></html>```")
                .as_deref(),
            Some("<html lang=\"en\"><body></body></html>")
        );
        assert_eq!(
            rule("fenced-closing-tag")
                .apply("```\n<!-- app -->\n<html></html>\n```")
                .as_deref(),
            Some("<!-- app -->\n<html></html>")
        );
        assert_eq!(rule("fenced-html").apply("no code here"), None);
    }

    #[test]
    fn test_rules_ignore_case() {
        let found = rule("fenced-html").apply("```HTML\n<p>loud</p>\n```");
        assert_eq!(found.as_deref(), Some("<p>loud</p>"));
    }

    #[test]
    fn test_empty_fence_is_no_match() {
        assert_eq!(rule("fenced-html").apply("```html\n   \n```"), None);
    }

    #[test]
    fn test_non_engineer_needs_html_mention() {
        let extractor = HtmlExtractor::new();
        let analyst = Message::from_persona("BusinessAnalyst", "```\n<p>x</p>\n```");
        assert!(!extractor.is_candidate(&analyst));

        let po = Message::from_persona("ProductOwner", "The HTML looks good");
        assert!(extractor.is_candidate(&po));

        assert!(!extractor.is_candidate(&Message::user("```html\n<p>x</p>\n```")));
    }

    #[test]
    fn test_raw_html_fallback() {
        let messages = [
            Message::from_persona("BusinessAnalyst", "Requirements are clear."),
            Message::from_persona(
                "ProductOwner",
                "Final page: <html><body><h1>Hi</h1></body></html> done",
            ),
        ];
        let found = HtmlExtractor::new().extract(&messages).unwrap();
        assert_eq!(found.html, "<html><body><h1>Hi</h1></body></html>");
        assert_eq!(found.source, ExtractionSource::Raw);
        assert_eq!(found.message_index, 1);
    }

    #[test]
    fn test_raw_fallback_prefers_doctype_span() {
        let messages = [Message::assistant(
            "<!DOCTYPE html>\n<html><head></head></html>",
        )];
        let found = HtmlExtractor::new().extract(&messages).unwrap();
        assert!(found.html.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn test_no_html_anywhere() {
        let messages = [
            Message::user("Build me a page"),
            engineer("I need more details first."),
            Message::from_persona("ProductOwner", "<body> tag without a document"),
        ];
        assert!(HtmlExtractor::new().extract(&messages).is_none());
    }

    #[test]
    fn test_custom_rule_is_tried_last() {
        fn svg(text: &str) -> Option<String> {
            let start = text.find("<svg")?;
            let end = text.find("</svg>")? + "</svg>".len();
            Some(text[start..end].to_string())
        }

        let extractor = HtmlExtractor::new().with_rule(ExtractionRule::new("svg", svg));
        assert_eq!(extractor.rules().len(), 7);

        let messages = [engineer("Icon: <svg><circle/></svg>")];
        let found = extractor.extract(&messages).unwrap();
        assert_eq!(found.source, ExtractionSource::Fenced("svg"));
    }
}
