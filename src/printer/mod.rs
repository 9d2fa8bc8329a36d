//! Progress Printer
//!
//! Keyed progress items rendered to the terminal while a research run is in
//! flight. Items keep their insertion order; updating a key rewrites that
//! item in place.
//!
//! # Modes
//!
//! - **Live** (stdout is a terminal): the whole item block is redrawn in place
//!   with crossterm. In-progress items show a spinner, done items a checkmark.
//!   The spinner frame follows wall-clock time; callers waiting on slow work
//!   call [`Printer::tick`] on a [`tick_interval`] to keep it moving.
//! - **Plain** (piped output, tests): one line is appended per change.

pub mod theme;

use crossterm::{
    cursor, queue,
    style::{ContentStyle, Print, PrintStyledContent},
    terminal::{self, ClearType},
};
use std::io::{self, IsTerminal, Write};
use std::time::{Duration, Instant};
use tokio::time::{self as tokio_time, Interval, MissedTickBehavior};
use tracing::debug;

pub use theme::{Icons, Theme};

/// How often the live spinner advances.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Interval for driving [`Printer::tick`] from a `select!` loop.
pub fn tick_interval() -> Interval {
    let mut interval = tokio_time::interval(TICK_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Live,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressItem {
    pub key: String,
    pub content: String,
    pub is_done: bool,
    pub hide_checkmark: bool,
}

impl ProgressItem {
    fn icon(&self, spinner_frame: usize) -> Option<&'static str> {
        match (self.is_done, self.hide_checkmark) {
            (true, true) => None,
            (true, false) => Some(Icons::COMPLETE),
            (false, _) => Some(Icons::SPINNER[spinner_frame % Icons::SPINNER.len()]),
        }
    }
}

pub struct Printer {
    out: Box<dyn Write + Send>,
    mode: DisplayMode,
    items: Vec<ProgressItem>,
    /// Terminal rows occupied by the last live redraw.
    rendered_rows: u16,
    started: Instant,
    ended: bool,
}

impl Printer {
    pub fn new(out: Box<dyn Write + Send>, mode: DisplayMode) -> Self {
        Self {
            out,
            mode,
            items: Vec::new(),
            rendered_rows: 0,
            started: Instant::now(),
            ended: false,
        }
    }

    /// Printer on stdout; live when stdout is a terminal.
    pub fn stdout() -> Self {
        let mode = if io::stdout().is_terminal() {
            DisplayMode::Live
        } else {
            DisplayMode::Plain
        };
        Self::new(Box::new(io::stdout()), mode)
    }

    pub fn items(&self) -> &[ProgressItem] {
        &self.items
    }

    pub fn item(&self, key: &str) -> Option<&ProgressItem> {
        self.items.iter().find(|item| item.key == key)
    }

    pub fn update_item(&mut self, key: &str, content: impl Into<String>, is_done: bool, hide_checkmark: bool) {
        let content = content.into();
        let index = match self.items.iter().position(|item| item.key == key) {
            Some(index) => {
                let item = &mut self.items[index];
                if item.content == content && item.is_done == is_done && item.hide_checkmark == hide_checkmark {
                    return;
                }
                item.content = content;
                item.is_done = is_done;
                item.hide_checkmark = hide_checkmark;
                index
            }
            None => {
                self.items.push(ProgressItem {
                    key: key.to_string(),
                    content,
                    is_done,
                    hide_checkmark,
                });
                self.items.len() - 1
            }
        };
        self.render(index);
    }

    pub fn mark_item_done(&mut self, key: &str) {
        let Some(index) = self.items.iter().position(|item| item.key == key) else {
            debug!(key, "mark_item_done on unknown progress item");
            return;
        };
        if self.items[index].is_done {
            return;
        }
        self.items[index].is_done = true;
        self.render(index);
    }

    /// Advance the live spinner. No-op in plain mode or when nothing is in progress.
    pub fn tick(&mut self) {
        if self.ended || self.mode != DisplayMode::Live || self.items.iter().all(|item| item.is_done) {
            return;
        }
        if let Err(e) = self.redraw() {
            debug!(error = %e, "Progress display write failed");
        }
    }

    /// Stop updating the display. Later updates are recorded but not drawn.
    pub fn end(&mut self) {
        if self.ended {
            return;
        }
        if self.mode == DisplayMode::Live {
            if let Err(e) = self.redraw() {
                debug!(error = %e, "Final progress redraw failed");
            }
        }
        self.ended = true;
        let _ = self.out.flush();
    }

    fn render(&mut self, changed: usize) {
        if self.ended {
            return;
        }
        let result = match self.mode {
            DisplayMode::Live => self.redraw(),
            DisplayMode::Plain => self.append_line(changed),
        };
        if let Err(e) = result {
            debug!(error = %e, "Progress display write failed");
        }
    }

    fn append_line(&mut self, index: usize) -> io::Result<()> {
        let item = &self.items[index];
        match (item.is_done, item.hide_checkmark) {
            (false, _) => writeln!(self.out, "{} {}", Icons::DOT, item.content)?,
            (true, false) => writeln!(self.out, "{} {}", Icons::COMPLETE, item.content)?,
            (true, true) => writeln!(self.out, "{}", item.content)?,
        }
        self.out.flush()
    }

    fn spinner_frame(&self) -> usize {
        (self.started.elapsed().as_millis() / TICK_INTERVAL.as_millis()) as usize
    }

    fn redraw(&mut self) -> io::Result<()> {
        if self.rendered_rows > 0 {
            queue!(
                self.out,
                cursor::MoveToPreviousLine(self.rendered_rows),
                terminal::Clear(ClearType::FromCursorDown)
            )?;
        }

        let (width, height) = terminal::size()
            .map(|(cols, rows)| (cols as usize, rows as usize))
            .unwrap_or((80, 24));
        let frame = self.spinner_frame();

        let rendered: Vec<(String, ContentStyle, &ProgressItem, usize)> = self
            .items
            .iter()
            .map(|item| {
                let (prefix, style) = match item.icon(frame) {
                    None => (String::new(), Theme::info()),
                    Some(icon) if item.is_done => (format!("{} ", icon), Theme::complete()),
                    Some(icon) => (format!("{} ", icon), Theme::active()),
                };
                let rows = wrapped_rows(&prefix, &item.content, width.max(1));
                (prefix, style, item, rows)
            })
            .collect();

        // The cursor cannot move above the top of the screen, so only the
        // newest items that fit are redrawn; older ones stay in scrollback.
        let max_rows = height.saturating_sub(1).max(1);
        let mut start = rendered.len();
        let mut rows = 0usize;
        while start > 0 && (rows + rendered[start - 1].3 <= max_rows || start == rendered.len()) {
            start -= 1;
            rows += rendered[start].3;
        }

        for (prefix, style, item, _) in &rendered[start..] {
            if !prefix.is_empty() {
                queue!(self.out, PrintStyledContent(style.apply(prefix.clone())))?;
            }
            queue!(self.out, Print(&item.content), Print("\n"))?;
        }

        self.rendered_rows = u16::try_from(rows.min(max_rows)).unwrap_or(u16::MAX);
        self.out.flush()
    }
}

/// Terminal rows taken by an item once long lines wrap.
fn wrapped_rows(prefix: &str, content: &str, width: usize) -> usize {
    content
        .split('\n')
        .enumerate()
        .map(|(i, line)| {
            let chars = line.chars().count() + if i == 0 { prefix.chars().count() } else { 0 };
            chars.div_ceil(width).max(1)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn plain_printer() -> (Printer, SharedBuffer) {
        let buffer = SharedBuffer::default();
        (Printer::new(Box::new(buffer.clone()), DisplayMode::Plain), buffer)
    }

    #[test]
    fn test_update_keeps_insertion_order() {
        let (mut printer, _) = plain_printer();
        printer.update_item("a", "first", false, false);
        printer.update_item("b", "second", false, false);
        printer.update_item("a", "first again", true, false);

        let keys: Vec<_> = printer.items().iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(printer.item("a").unwrap().content, "first again");
        assert!(printer.item("a").unwrap().is_done);
    }

    #[test]
    fn test_plain_mode_lines() {
        let (mut printer, buffer) = plain_printer();
        printer.update_item("trace_id", "Trace: trace_1", true, true);
        printer.update_item("searching", "Searching...", false, false);
        printer.update_item("searching", "Searching...", false, false);
        printer.mark_item_done("searching");
        printer.end();

        assert_eq!(
            buffer.contents(),
            "Trace: trace_1\n• Searching...\n✓ Searching...\n"
        );
    }

    #[test]
    fn test_updates_after_end_are_not_drawn() {
        let (mut printer, buffer) = plain_printer();
        printer.update_item("a", "before", true, false);
        printer.end();
        printer.update_item("a", "after", true, false);

        assert_eq!(buffer.contents(), "✓ before\n");
        assert_eq!(printer.item("a").unwrap().content, "after");
    }

    #[test]
    fn test_mark_unknown_item_is_ignored() {
        let (mut printer, buffer) = plain_printer();
        printer.mark_item_done("missing");
        assert!(printer.items().is_empty());
        assert!(buffer.contents().is_empty());
    }

    #[test]
    fn test_wrapped_rows() {
        assert_eq!(wrapped_rows("✓ ", "short", 80), 1);
        assert_eq!(wrapped_rows("", "a\nb\n", 80), 3);
        assert_eq!(wrapped_rows("• ", &"x".repeat(18), 10), 2);
    }

    #[test]
    fn test_live_redraw_never_climbs_past_screen_top() {
        let buffer = SharedBuffer::default();
        let mut printer = Printer::new(Box::new(buffer.clone()), DisplayMode::Live);
        for i in 0..200 {
            printer.update_item(&format!("item_{}", i), format!("line {}", i), true, false);
        }

        let height = terminal::size().map(|(_, rows)| rows as usize).unwrap_or(24);
        assert!(usize::from(printer.rendered_rows) <= height.saturating_sub(1).max(1));
        assert!(buffer.contents().contains("line 199"));
    }

    #[test]
    fn test_tick_only_redraws_live_in_progress_blocks() {
        let (mut plain, plain_buffer) = plain_printer();
        plain.update_item("a", "working", false, false);
        let before = plain_buffer.contents();
        plain.tick();
        assert_eq!(plain_buffer.contents(), before);

        let buffer = SharedBuffer::default();
        let mut live = Printer::new(Box::new(buffer.clone()), DisplayMode::Live);
        live.update_item("a", "done", true, false);
        let before = buffer.contents();
        live.tick();
        assert_eq!(buffer.contents(), before);

        live.update_item("b", "working", false, false);
        let before = buffer.contents().len();
        live.tick();
        assert!(buffer.contents().len() > before);
    }

    #[test]
    fn test_live_mode_redraws_block() {
        let buffer = SharedBuffer::default();
        let mut printer = Printer::new(Box::new(buffer.clone()), DisplayMode::Live);
        printer.update_item("a", "one", false, false);
        printer.update_item("b", "two", true, false);

        let output = buffer.contents();
        assert_eq!(output.matches("one").count(), 2);
        assert!(output.contains("two"));
        assert!(output.contains(Icons::COMPLETE));
        assert_eq!(printer.rendered_rows, 2);
    }
}
