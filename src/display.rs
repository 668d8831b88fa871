use anyhow::Context;
use log::{error, trace};
use std::{
    io::{self, Write},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// Handle to the screen that every renderer draws on. Panels draw from the
/// event loop, the ticker and progress from wherever, so it lives behind a
/// lock.
#[derive(Clone)]
pub struct SharedScreen(Arc<Mutex<Screen>>);

impl SharedScreen {
    pub fn new(screen: Screen) -> Self {
        Self(Arc::new(Mutex::new(screen)))
    }

    pub fn lock(&self) -> MutexGuard<'_, Screen> {
        // The screen is just a text buffer, a panic mid-draw can't leave it in
        // a state worse than some stale text
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A plain text screen. Output is only rewritten when the content actually
/// changed, so repeated draws of the same frame are free.
pub struct Screen {
    /// The text currently on the screen
    text_buffer: Vec<String>,
    /// Body lines of the most recent draw
    body: Vec<String>,
    /// Bottom line, owned by the ticker
    footer: String,
    output: Box<dyn Write + Send>,
}

impl Screen {
    /// Width of the screen, in characters
    pub const WIDTH: usize = 40;

    pub fn new(output: Box<dyn Write + Send>) -> Self {
        Self {
            text_buffer: Vec::new(),
            body: Vec::new(),
            footer: String::new(),
            output,
        }
    }

    /// Screen that writes to stderr. Stdout belongs to the host transport.
    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }

    /// Replace the main area with a titled block of lines
    pub fn draw(&mut self, title: &str, lines: &[String]) {
        self.body = Vec::with_capacity(lines.len() + 2);
        self.body.push(title.to_owned());
        self.body.push("=".repeat(Self::WIDTH));
        self.body.extend(lines.iter().cloned());
        self.flush();
    }

    pub fn set_footer(&mut self, footer: String) {
        self.footer = footer;
        self.flush();
    }

    /// The lines currently shown, footer included
    pub fn text(&self) -> &[String] {
        &self.text_buffer
    }

    fn flush(&mut self) {
        let mut next_text_buffer = self.body.clone();
        if !self.footer.is_empty() {
            next_text_buffer.push("-".repeat(Self::WIDTH));
            next_text_buffer.push(self.footer.clone());
        }

        if next_text_buffer != self.text_buffer {
            trace!(
                "Text changed: old={:?}; new={:?}",
                self.text_buffer,
                next_text_buffer
            );
            self.text_buffer = next_text_buffer;
            if let Err(err) = self.write_text() {
                error!("Error writing to screen: {err:?}");
            }
        }
    }

    fn write_text(&mut self) -> anyhow::Result<()> {
        // Form feed, so a terminal pager shows one screen at a time
        let mut out = String::from("\x0c");
        for line in &self.text_buffer {
            out.push_str(line);
            out.push('\n');
        }
        self.output
            .write_all(out.as_bytes())
            .context("Error writing screen text")?;
        self.output.flush().context("Error flushing screen")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::SharedBuffer;

    #[test]
    fn test_only_writes_changes() {
        let buffer = SharedBuffer::default();
        let mut screen = Screen::new(Box::new(buffer.clone()));

        screen.draw("Title", &["one".into()]);
        let written = buffer.contents().len();
        assert!(written > 0);
        assert_eq!(screen.text()[0], "Title");
        assert_eq!(screen.text()[2], "one");

        // Same content, nothing new written
        screen.draw("Title", &["one".into()]);
        assert_eq!(buffer.contents().len(), written);

        screen.set_footer("Conditions at Boston".into());
        assert!(buffer.contents().len() > written);
        assert_eq!(screen.text().last().unwrap(), "Conditions at Boston");
    }
}
