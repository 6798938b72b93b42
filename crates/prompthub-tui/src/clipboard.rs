use anyhow::{Context, Result};

/// Somewhere copied text can go.
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The desktop clipboard. Opened on first use; headless sessions only fail
/// when something is actually copied.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        if self.inner.is_none() {
            self.inner = Some(arboard::Clipboard::new().context("clipboard unavailable")?);
        }
        match self.inner.as_mut() {
            Some(clipboard) => clipboard
                .set_text(text)
                .context("failed to write to clipboard"),
            None => anyhow::bail!("clipboard unavailable"),
        }
    }
}
