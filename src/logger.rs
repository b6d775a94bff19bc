//! A `log` backend writing to the diagnostic channel.
//!
//! Application logs share the debug port with test output, so they go through the same channel:
//! records logged from interrupt handlers are deferred and flushed with everything else.

use crate::Channel;
use log::{LevelFilter, Log, Metadata, Record};

/// Writes each log record as a single line: `<ticks> <LEVEL> <target> <message>`.
///
/// ```
/// use log::LevelFilter;
/// use rtos_test::{host::HostPlatform, Channel, ChannelLogger};
///
/// static PLATFORM: std::sync::LazyLock<HostPlatform> = std::sync::LazyLock::new(HostPlatform::new);
/// static CHANNEL: std::sync::LazyLock<Channel> = std::sync::LazyLock::new(|| Channel::new(&*PLATFORM));
/// static LOGGER: std::sync::LazyLock<ChannelLogger> =
///     std::sync::LazyLock::new(|| ChannelLogger::new(&CHANNEL, LevelFilter::Info));
///
/// log::set_logger(&*LOGGER).unwrap();
/// log::set_max_level(LOGGER.level());
/// log::info!("started");
/// ```
#[derive(Debug)]
pub struct ChannelLogger<'a> {
    channel: &'a Channel<'a>,
    level: LevelFilter,
}

impl<'a> ChannelLogger<'a> {
    /// Creates a logger passing records at or above `level`.
    pub const fn new(channel: &'a Channel<'a>, level: LevelFilter) -> Self {
        Self { channel, level }
    }

    /// The most verbose level this logger passes.
    pub fn level(&self) -> LevelFilter {
        self.level
    }
}

impl Log for ChannelLogger<'_> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.channel.line(format_args!(
                "{} {} {} {}",
                self.channel.platform().ticks(),
                record.level(),
                record.target(),
                record.args()
            ));
        }
    }

    fn flush(&self) {
        self.channel.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::ChannelLogger;
    use crate::{host::HostPlatform, Channel};
    use claims::{assert_ok, assert_some};
    use log::{Level, LevelFilter, Log, Metadata, Record};

    fn strip_ticks(output: &str) -> &str {
        let (ticks, rest) = assert_some!(output.split_once(' '));
        assert_ok!(ticks.parse::<u32>());
        rest
    }

    #[test]
    fn enabled() {
        let platform = HostPlatform::new();
        let channel = Channel::new(&platform);
        let logger = ChannelLogger::new(&channel, LevelFilter::Info);

        assert!(logger.enabled(&Metadata::builder().level(Level::Error).build()));
        assert!(logger.enabled(&Metadata::builder().level(Level::Info).build()));
        assert!(!logger.enabled(&Metadata::builder().level(Level::Debug).build()));
    }

    #[test]
    fn log_line() {
        let platform = HostPlatform::new();
        let channel = Channel::new(&platform);
        let logger = ChannelLogger::new(&channel, LevelFilter::Trace);

        logger.log(
            &Record::builder()
                .args(format_args!("link up at {} baud", 115200))
                .level(Level::Warn)
                .target("uart")
                .build(),
        );

        assert_eq!(
            strip_ticks(&platform.output()),
            "WARN uart link up at 115200 baud\n"
        );
    }

    #[test]
    fn log_filtered() {
        let platform = HostPlatform::new();
        let channel = Channel::new(&platform);
        let logger = ChannelLogger::new(&channel, LevelFilter::Warn);

        logger.log(
            &Record::builder()
                .args(format_args!("noise"))
                .level(Level::Debug)
                .target("uart")
                .build(),
        );

        assert_eq!(platform.output(), "");
    }

    #[test]
    fn log_from_interrupt() {
        let platform = HostPlatform::new();
        let channel = Channel::new(&platform);
        let logger = ChannelLogger::new(&channel, LevelFilter::Info);

        HostPlatform::interrupt(|| {
            logger.log(
                &Record::builder()
                    .args(format_args!("irq"))
                    .level(Level::Info)
                    .target("timer")
                    .build(),
            )
        });
        assert_eq!(platform.output(), "");

        logger.flush();
        assert_eq!(strip_ticks(&platform.output()), "INFO timer irq\n");
    }
}
