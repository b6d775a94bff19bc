//! The diagnostic channel: line-oriented text output over the debug port.
//!
//! Output can be produced from two execution contexts. Normal context may safely transmit
//! characters, possibly blocking while the port drains. Interrupt context must never block, so its
//! output is appended to a deferred buffer instead and transmitted at the next safe point: the next
//! line started from normal context, or an explicit [`Channel::flush()`] or
//! [`Channel::end_line()`]. Deferred output is only ever transmitted at the start of a line.
//!
//! Text passed through the formatting entry points ([`Channel::write_fmt()`] and
//! [`Channel::line()`]) is rendered "safely": backslashes, carriage returns and newlines are
//! escaped, and any other non-printable byte is replaced with `?`. This guarantees one report per
//! line no matter what ends up in a formatted message.

use crate::{platform::Platform, ring::RingBuffer};
use core::{
    fmt,
    fmt::Write,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// Size of the deferred buffer holding output produced in interrupt context.
pub const DEFERRED_LOG_CAPACITY: usize = 512;

/// Where bytes of a single write end up.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Route {
    /// Straight to the transmitter.
    Direct,
    /// Into the deferred buffer.
    Deferred,
}

/// An interrupt-safe text sink over the platform's transmitter.
pub struct Channel<'a> {
    platform: &'a dyn Platform,
    deferred: RingBuffer<DEFERRED_LOG_CAPACITY>,
    /// Whether normal-context output has started a line that has not yet ended.
    mid_line: AtomicBool,
    dropped: AtomicUsize,
}

impl<'a> Channel<'a> {
    /// Creates a channel transmitting through `platform`.
    ///
    /// This is a `const fn` so the channel can live in a `static`, where interrupt handlers can
    /// reach it.
    pub const fn new(platform: &'a dyn Platform) -> Self {
        Self {
            platform,
            deferred: RingBuffer::new(),
            mid_line: AtomicBool::new(false),
            dropped: AtomicUsize::new(0),
        }
    }

    /// The platform this channel transmits through.
    pub fn platform(&self) -> &'a dyn Platform {
        self.platform
    }

    /// Writes raw text.
    ///
    /// Unlike the formatting entry points, the text is transmitted as is.
    pub fn write_str(&self, text: &str) {
        let route = self.route();
        for byte in text.bytes() {
            self.emit(route, byte);
        }
        if let Some(&last) = text.as_bytes().last() {
            self.finish(route, last == b'\n');
        }
    }

    /// Writes formatted text, escaping anything that is not printable.
    pub fn write_fmt(&self, args: fmt::Arguments<'_>) {
        let route = self.route();
        let mut writer = SafeWriter {
            channel: self,
            route,
        };
        // `SafeWriter` never fails, so an error here can only come from a `Display` impl, in which
        // case the partial output is all there is to show.
        let _ = writer.write_fmt(args);
        // Formatted text never ends a line, since its newlines are escaped.
        self.finish(route, false);
    }

    /// Writes a full line of formatted text, followed by a raw newline.
    pub fn line(&self, args: fmt::Arguments<'_>) {
        let route = self.route();
        let mut writer = SafeWriter {
            channel: self,
            route,
        };
        let _ = writer.write_fmt(args);
        self.emit(route, b'\n');
        self.finish(route, true);
    }

    /// Transmits everything held in the deferred buffer, oldest first.
    ///
    /// Does nothing when called from interrupt context, since draining means transmitting. Does
    /// nothing either while normal-context output has a line open; the buffer is then drained
    /// once that line ends.
    pub fn flush(&self) {
        if self.platform.in_interrupt() || self.mid_line.load(Ordering::Relaxed) {
            return;
        }
        self.deferred.drain(|byte| self.platform.transmit(byte));
    }

    /// Ends any line left open by normal-context output, then flushes.
    ///
    /// Used before reports that must start on a line of their own. Does nothing when called from
    /// interrupt context.
    pub fn end_line(&self) {
        if self.platform.in_interrupt() {
            return;
        }
        if self.mid_line.swap(false, Ordering::Relaxed) {
            self.platform.transmit(b'\n');
        }
        self.flush();
    }

    /// Returns the number of bytes waiting in the deferred buffer.
    pub fn pending(&self) -> usize {
        self.deferred.len()
    }

    /// Returns the number of bytes dropped because the deferred buffer was full.
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Decides how a write starting now is routed.
    ///
    /// Deferred output is flushed before normal-context text only at the start of a line, so it
    /// never lands in the middle of one.
    fn route(&self) -> Route {
        if self.platform.in_interrupt() {
            Route::Deferred
        } else {
            if !self.mid_line.load(Ordering::Relaxed) {
                self.flush();
            }
            Route::Direct
        }
    }

    fn emit(&self, route: Route, byte: u8) {
        match route {
            Route::Direct => self.platform.transmit(byte),
            Route::Deferred => {
                if !self.deferred.push(byte) {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Records whether normal-context output was left mid-line.
    fn finish(&self, route: Route, ends_line: bool) {
        if route == Route::Direct {
            self.mid_line.store(!ends_line, Ordering::Relaxed);
        }
    }
}

impl fmt::Debug for Channel<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter
            .debug_struct("Channel")
            .field("pending", &self.pending())
            .field("dropped", &self.dropped())
            .field("mid_line", &self.mid_line.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Renders formatted text into a channel one escaped byte at a time.
struct SafeWriter<'c, 'a> {
    channel: &'c Channel<'a>,
    route: Route,
}

impl Write for SafeWriter<'_, '_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            match byte {
                b'\\' => {
                    self.channel.emit(self.route, b'\\');
                    self.channel.emit(self.route, b'\\');
                }
                b'\r' => {
                    self.channel.emit(self.route, b'\\');
                    self.channel.emit(self.route, b'r');
                }
                b'\n' => {
                    self.channel.emit(self.route, b'\\');
                    self.channel.emit(self.route, b'n');
                }
                b' '..=b'~' => self.channel.emit(self.route, byte),
                _ => self.channel.emit(self.route, b'?'),
            }
        }
        Ok(())
    }
}
