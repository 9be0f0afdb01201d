use core::fmt;
use log::{Log, LevelFilter, Metadata, Record, SetLoggerError, set_logger, set_max_level};

/// `log` backend printing every record on the boot console. There is no
/// timer running during SDRAM bring-up, so records carry no timestamp.
pub struct ConsoleLogger {
    sink: fn(fmt::Arguments),
}

impl ConsoleLogger {
    pub const fn new(sink: fn(fmt::Arguments)) -> ConsoleLogger {
        ConsoleLogger { sink: sink }
    }

    pub fn register(&'static self, level: LevelFilter) -> Result<(), SetLoggerError> {
        set_logger(self)?;
        set_max_level(level);
        Ok(())
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            (self.sink)(format_args!("{:>5}({}): {}\n",
                                     record.level(), record.target(), record.args()));
        }
    }

    fn flush(&self) {
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fmt::Write;
    use log::Level;

    thread_local! {
        static LINES: RefCell<String> = RefCell::new(String::new());
    }

    fn capture(args: fmt::Arguments) {
        LINES.with(|lines| { let _ = lines.borrow_mut().write_fmt(args); });
    }

    #[test]
    fn formats_level_and_target() {
        let logger = ConsoleLogger::new(capture);
        logger.log(&Record::builder()
            .level(Level::Warn)
            .target("sdram_misoc::rdelay")
            .args(format_args!("module {}: narrow window", 1))
            .build());
        logger.log(&Record::builder()
            .level(Level::Info)
            .target("sdram_misoc::sdram")
            .args(format_args!("memtest -> pass"))
            .build());

        LINES.with(|lines| {
            assert_eq!(*lines.borrow(),
                       " WARN(sdram_misoc::rdelay): module 1: narrow window\n \
                        INFO(sdram_misoc::sdram): memtest -> pass\n");
        });
    }
}
