use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::Item;

/// Longest label the add form accepts.
const MAX_LABEL_CHARS: usize = 80;

/// State of the "add item" popup.
#[derive(Default, Clone)]
pub(crate) struct LabelForm {
    pub(crate) label: String,
    pub(crate) error: Option<String>,
}

impl LabelForm {
    /// Seed the form with a suggested label (usually the current city), cut to
    /// the same length limit typed input gets.
    pub(crate) fn with_label(label: &str) -> Self {
        Self {
            label: label.chars().take(MAX_LABEL_CHARS).collect(),
            error: None,
        }
    }

    /// Append a character, ignoring control characters and anything past the
    /// length limit.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() || self.label.chars().count() >= MAX_LABEL_CHARS {
            return false;
        }
        self.label.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.label.pop();
    }

    pub(crate) fn parse_label(&self) -> Result<String> {
        let label = self.label.trim();
        if label.is_empty() {
            return Err(anyhow!("Label is required."));
        }
        Ok(label.to_string())
    }

    pub(crate) fn build_line(&self) -> Line<'static> {
        let (display, style) = if self.label.is_empty() {
            ("<required>".to_string(), Style::default().fg(Color::DarkGray))
        } else {
            (self.label.clone(), Style::default().fg(Color::Yellow))
        };

        Line::from(vec![Span::raw("Label: "), Span::styled(display, style)])
    }

    pub(crate) fn value_len(&self) -> usize {
        self.label.chars().count()
    }
}

/// Snapshot of the item awaiting delete confirmation.
#[derive(Clone)]
pub(crate) struct ConfirmItemDelete {
    pub(crate) id: i64,
    pub(crate) label: String,
    pub(crate) count: i64,
}

impl From<&Item> for ConfirmItemDelete {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            label: item.label.clone(),
            count: item.count,
        }
    }
}
