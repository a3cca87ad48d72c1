#![forbid(unsafe_code)]

use std::io::{self, BufRead, Write};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use soundword_engines::response_device::{InputEventSource, MonotonicClock};
use soundword_engines::DeviceError;
use soundword_kernel_contracts::catalog::Word;
use soundword_kernel_contracts::device::InputEvent;
use soundword_kernel_contracts::MonotonicTimeNs;
use soundword_os::collaborators::{Presenter, ScreenKind, ScreenOutcome};
use soundword_os::ExecutionError;

/// A trimmed input line and the time it arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampedLine {
    pub text: String,
    pub at: MonotonicTimeNs,
}

/// One line stream shared by the presenter and the keyboard source.
///
/// Lines are stamped by a reader thread as they arrive, so a line typed before a response
/// wait starts keeps its earlier stamp even if it is consumed later.
#[derive(Debug)]
pub struct SharedLines {
    rx: Rc<Receiver<io::Result<StampedLine>>>,
}

impl Clone for SharedLines {
    fn clone(&self) -> Self {
        Self {
            rx: Rc::clone(&self.rx),
        }
    }
}

impl SharedLines {
    /// Reads `reader` on its own thread until end of input or the first read error.
    pub fn spawn_reader<R, C>(reader: R, clock: C) -> Self
    where
        R: BufRead + Send + 'static,
        C: MonotonicClock + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in reader.lines() {
                let stamped = line.map(|text| StampedLine {
                    text: text.trim().to_string(),
                    at: clock.now(),
                });
                let failed = stamped.is_err();
                if tx.send(stamped).is_err() || failed {
                    break;
                }
            }
        });
        Self { rx: Rc::new(rx) }
    }

    /// A stream of lines that have already arrived.
    pub fn from_stamped(lines: impl IntoIterator<Item = StampedLine>) -> Self {
        let (tx, rx) = mpsc::channel();
        for line in lines {
            // The receiver is held below, so sending cannot fail.
            let _ = tx.send(Ok(line));
        }
        Self { rx: Rc::new(rx) }
    }

    /// Blocks for the next line; `None` once input has ended.
    pub fn next_line(&self) -> io::Result<Option<StampedLine>> {
        match self.rx.recv() {
            Ok(line) => line.map(Some),
            Err(_) => Ok(None),
        }
    }
}

fn is_quit(line: &str) -> bool {
    matches!(
        line.to_ascii_lowercase().as_str(),
        "q" | "quit" | "escape" | "esc"
    )
}

/// Line-oriented presenter for terminals.
pub struct ConsolePresenter<W> {
    lines: SharedLines,
    out: W,
}

impl<W: Write> ConsolePresenter<W> {
    pub fn new(lines: SharedLines, out: W) -> Self {
        Self { lines, out }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    fn say(&mut self, text: &str) -> Result<(), ExecutionError> {
        writeln!(self.out, "{text}")
            .and_then(|_| self.out.flush())
            .map_err(|e| ExecutionError::Presenter(e.to_string()))
    }
}

impl<W: Write> Presenter for ConsolePresenter<W> {
    fn show_fixation(&mut self) -> Result<(), ExecutionError> {
        self.say("+")
    }

    fn show_stimulus_cue(&mut self) -> Result<(), ExecutionError> {
        self.say("(listen)")
    }

    fn show_word(&mut self, word: &Word) -> Result<(), ExecutionError> {
        self.say(word.as_str())
    }

    fn show_response_prompt(&mut self) -> Result<(), ExecutionError> {
        self.say("?")
    }

    fn clear(&mut self) -> Result<(), ExecutionError> {
        self.say("")
    }

    /// End of input counts as a quit.
    fn show_screen(
        &mut self,
        kind: ScreenKind,
        title: &str,
        text: &str,
    ) -> Result<ScreenOutcome, ExecutionError> {
        let footer = match kind {
            ScreenKind::Instructions => "Press Enter to begin, q to quit.",
            ScreenKind::Break => "Press Enter to continue, q to quit.",
        };
        self.say(&format!("== {title} ==\n{text}\n{footer}"))?;
        let line = self
            .lines
            .next_line()
            .map_err(|e| ExecutionError::Presenter(e.to_string()))?;
        Ok(match line {
            Some(l) if !is_quit(&l.text) => ScreenOutcome::Continue,
            _ => ScreenOutcome::Quit,
        })
    }
}

/// Keyboard responses typed as lines. The first token of each line is the key name; the event
/// carries the line's arrival stamp.
pub struct LineKeyboard {
    lines: SharedLines,
}

impl LineKeyboard {
    pub fn new(lines: SharedLines) -> Self {
        Self { lines }
    }
}

impl InputEventSource for LineKeyboard {
    fn next_event(&mut self) -> Result<InputEvent, DeviceError> {
        loop {
            let line = self
                .lines
                .next_line()
                .map_err(|e| DeviceError::Source(e.to_string()))?
                .ok_or(DeviceError::Closed)?;
            let Some(token) = line.text.split_whitespace().next() else {
                continue;
            };
            if let Ok(event) = InputEvent::key(token, line.at) {
                return Ok(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use super::*;
    use soundword_engines::response_device::{NoGamepadHardware, ResponseDevice};
    use soundword_kernel_contracts::device::{GamepadMap, InputCode, KeyName, KeyboardMap};
    use soundword_kernel_contracts::trial::LogicalResponse;

    /// Advances one millisecond per reading; shareable with the reader thread.
    #[derive(Clone, Default)]
    struct Tick(Arc<AtomicU64>);

    impl MonotonicClock for Tick {
        fn now(&self) -> MonotonicTimeNs {
            MonotonicTimeNs(self.0.fetch_add(1_000_000, Ordering::SeqCst) + 1_000_000)
        }
    }

    struct At(MonotonicTimeNs);

    impl MonotonicClock for At {
        fn now(&self) -> MonotonicTimeNs {
            self.0
        }
    }

    fn lines(text: &str) -> SharedLines {
        SharedLines::spawn_reader(Cursor::new(text.as_bytes().to_vec()), Tick::default())
    }

    fn stamped(text: &str, ms: u64) -> StampedLine {
        StampedLine {
            text: text.to_string(),
            at: MonotonicTimeNs::from_ms(ms),
        }
    }

    #[test]
    fn at_console_01_enter_continues_and_q_quits() {
        let mut p = ConsolePresenter::new(lines("\nQ\n"), Vec::new());
        assert_eq!(
            p.show_screen(ScreenKind::Instructions, "Title", "Read me").unwrap(),
            ScreenOutcome::Continue
        );
        assert_eq!(
            p.show_screen(ScreenKind::Break, "Title", "Rest").unwrap(),
            ScreenOutcome::Quit
        );
        let out = String::from_utf8(p.into_output()).unwrap();
        assert!(out.starts_with("== Title ==\nRead me\n"));
        assert!(out.contains("Rest"));
    }

    #[test]
    fn at_console_02_end_of_input_is_a_quit() {
        let mut p = ConsolePresenter::new(lines(""), Vec::new());
        assert_eq!(
            p.show_screen(ScreenKind::Instructions, "T", "x").unwrap(),
            ScreenOutcome::Quit
        );
    }

    #[test]
    fn at_console_03_keyboard_skips_blank_lines_and_takes_first_token() {
        let mut kb = LineKeyboard::new(lines("\n   \nY please\n"));
        let event = kb.next_event().unwrap();
        assert_eq!(event.code, InputCode::Key(KeyName::new("y").unwrap()));
        // Third line read, third clock reading.
        assert_eq!(event.at, MonotonicTimeNs::from_ms(3));
        assert!(matches!(kb.next_event(), Err(DeviceError::Closed)));
    }

    #[test]
    fn at_console_04_presenter_and_keyboard_consume_one_stream_in_order() {
        let shared = lines("\nn\n");
        let mut p = ConsolePresenter::new(shared.clone(), Vec::new());
        let mut kb = LineKeyboard::new(shared);
        assert_eq!(
            p.show_screen(ScreenKind::Instructions, "T", "x").unwrap(),
            ScreenOutcome::Continue
        );
        let event = kb.next_event().unwrap();
        assert_eq!(event.code, InputCode::Key(KeyName::new("n").unwrap()));
    }

    #[test]
    fn at_console_05_line_typed_before_the_response_wait_is_discarded() {
        // "y" arrived during the label flash, "n" after the prompt at 1000 ms.
        let mut kb = LineKeyboard::new(SharedLines::from_stamped([
            stamped("y", 900),
            stamped("n", 1_340),
        ]));
        let device = ResponseDevice::acquire(
            &mut NoGamepadHardware,
            KeyboardMap::default(),
            GamepadMap::default(),
        );
        let captured = device
            .get_response(&mut kb, &At(MonotonicTimeNs::from_ms(1_000)))
            .unwrap();
        assert_eq!(captured.response, LogicalResponse::NO);
        assert_eq!(captured.reaction_time_ms.0, 340);
    }
}
