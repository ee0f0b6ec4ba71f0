// SPDX-License-Identifier: Apache-2.0 OR MIT
// Logging macros for convenient logging
//
// Every macro takes an optional explicit context before `=>`; without it the
// globally installed context is used (or stderr when none is installed).

#[doc(hidden)]
#[macro_export]
macro_rules! __log_level {
    ($target:expr, $level:expr, $($arg:tt)+) => {{
        let mut saver = $crate::logging::LevelLogSaver::new($target, $level, file!(), line!());
        saver.write_fmt(format_args!($($arg)+));
        saver.commit();
    }};
}

/// Log a message at INFO
///
/// # Examples
/// ```ignore
/// log_info!("listening on {}", addr);
/// log_info!(&logging => "worker {} started", id);
/// ```
#[macro_export]
macro_rules! log_info {
    ($ctx:expr => $($arg:tt)+) => {
        $crate::__log_level!($crate::logging::LogTarget::from($ctx), $crate::logging::Level::Info, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__log_level!($crate::logging::LogTarget::global(), $crate::logging::Level::Info, $($arg)+)
    };
}

/// Log a message at WARNING (also lands in the INFO file)
#[macro_export]
macro_rules! log_warning {
    ($ctx:expr => $($arg:tt)+) => {
        $crate::__log_level!($crate::logging::LogTarget::from($ctx), $crate::logging::Level::Warning, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__log_level!($crate::logging::LogTarget::global(), $crate::logging::Level::Warning, $($arg)+)
    };
}

/// Log a message at ERROR (also lands in the WARNING and INFO files)
#[macro_export]
macro_rules! log_error {
    ($ctx:expr => $($arg:tt)+) => {
        $crate::__log_level!($crate::logging::LogTarget::from($ctx), $crate::logging::Level::Error, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__log_level!($crate::logging::LogTarget::global(), $crate::logging::Level::Error, $($arg)+)
    };
}

/// Log a FATAL message and terminate the process. Evaluates to `!`.
///
/// # Examples
/// ```ignore
/// let fd = open(path).unwrap_or_else(|e| log_fatal!("open {}: {}", path, e));
/// ```
#[macro_export]
macro_rules! log_fatal {
    ($ctx:expr => $($arg:tt)+) => {
        $crate::__log_fatal!($crate::logging::LogTarget::from($ctx), $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__log_fatal!($crate::logging::LogTarget::global(), $($arg)+)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_fatal {
    ($target:expr, $($arg:tt)+) => {{
        let mut saver = $crate::logging::LevelLogSaver::new(
            $target,
            $crate::logging::Level::Fatal,
            file!(),
            line!(),
        );
        saver.put("fatal error! ");
        saver.write_fmt(format_args!($($arg)+));
        saver.fatal()
    }};
}

/// Log to the file of a tag
///
/// # Examples
/// ```ignore
/// log_tagged!("access", "GET {} {}", path, status);
/// ```
#[macro_export]
macro_rules! log_tagged {
    ($ctx:expr => $tag:expr, $($arg:tt)+) => {{
        let mut saver = $crate::logging::TaggedLogSaver::new(
            $crate::logging::LogTarget::from($ctx),
            $tag,
            file!(),
            line!(),
        );
        saver.write_fmt(format_args!($($arg)+));
        saver.commit();
    }};
    ($tag:expr, $($arg:tt)+) => {{
        let mut saver = $crate::logging::TaggedLogSaver::new(
            $crate::logging::LogTarget::global(),
            $tag,
            file!(),
            line!(),
        );
        saver.write_fmt(format_args!($($arg)+));
        saver.commit();
    }};
}

/// Log to the debug tag `dlog_<tag>`, only when `dlog_on` is set.
/// Arguments are not evaluated otherwise.
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr => $tag:expr, $($arg:tt)+) => {
        if let Some(mut saver) = $crate::logging::TaggedLogSaver::debug(
            $crate::logging::LogTarget::from($ctx),
            $tag,
            file!(),
            line!(),
        ) {
            saver.write_fmt(format_args!($($arg)+));
            saver.commit();
        }
    };
    ($tag:expr, $($arg:tt)+) => {
        if let Some(mut saver) = $crate::logging::TaggedLogSaver::debug(
            $crate::logging::LogTarget::global(),
            $tag,
            file!(),
            line!(),
        ) {
            saver.write_fmt(format_args!($($arg)+));
            saver.commit();
        }
    };
}

/// Emit a telemetry record: `log_telemetry!("topic"; field, field, ...)`
#[macro_export]
macro_rules! log_telemetry {
    ($ctx:expr => $topic:expr; $($value:expr),* $(,)?) => {{
        let mut saver = $crate::logging::TelemetryLogSaver::new(
            $crate::logging::LogTarget::from($ctx),
            $topic,
        );
        $( saver.put($value); )*
        saver.commit();
    }};
    ($topic:expr; $($value:expr),* $(,)?) => {{
        let mut saver = $crate::logging::TelemetryLogSaver::new(
            $crate::logging::LogTarget::global(),
            $topic,
        );
        $( saver.put($value); )*
        saver.commit();
    }};
}

/// Write `file:line] message` to stderr right away
#[macro_export]
macro_rules! log_stderr {
    ($($arg:tt)+) => {{
        let mut saver = $crate::logging::StderrLogSaver::new(file!(), line!());
        saver.write_fmt(format_args!($($arg)+));
        saver.commit();
    }};
}

/// Take the FATAL path unless `cond` holds
///
/// # Examples
/// ```ignore
/// check!(queue.len() < limit, "queue overflow: {}", queue.len());
/// ```
#[macro_export]
macro_rules! check {
    ($ctx:expr => $cond:expr $(, $($arg:tt)+)?) => {
        $crate::__check!($crate::logging::LogTarget::from($ctx), $cond $(, $($arg)+)?)
    };
    ($cond:expr $(, $($arg:tt)+)?) => {
        $crate::__check!($crate::logging::LogTarget::global(), $cond $(, $($arg)+)?)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __check {
    ($target:expr, $cond:expr $(, $($arg:tt)+)?) => {
        if !($cond) {
            let mut saver = $crate::logging::LevelLogSaver::new(
                $target,
                $crate::logging::Level::Fatal,
                file!(),
                line!(),
            );
            saver.put(concat!("check failed: ", stringify!($cond), "! "));
            $( saver.write_fmt(format_args!($($arg)+)); )?
            saver.fatal();
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __check_op {
    ($target:expr, $a:expr, $b:expr, $op:tt $(, $($arg:tt)+)?) => {
        match (&$a, &$b) {
            (a, b) => {
                if !(*a $op *b) {
                    let mut saver = $crate::logging::LevelLogSaver::new(
                        $target,
                        $crate::logging::Level::Fatal,
                        file!(),
                        line!(),
                    );
                    saver.put(concat!(
                        "check failed: ",
                        stringify!($a),
                        " ",
                        stringify!($op),
                        " ",
                        stringify!($b),
                        ", "
                    ));
                    saver.write_fmt(format_args!("{:?} vs {:?}", a, b));
                    $( saver.put(" "); saver.write_fmt(format_args!($($arg)+)); )?
                    saver.fatal();
                }
            }
        }
    };
}

/// Take the FATAL path unless `a == b`, logging both values
///
/// # Examples
/// ```ignore
/// check_eq!(written, expected, "short write on {}", path);
/// ```
#[macro_export]
macro_rules! check_eq {
    ($ctx:expr => $a:expr, $b:expr $(, $($arg:tt)+)?) => {
        $crate::__check_op!($crate::logging::LogTarget::from($ctx), $a, $b, == $(, $($arg)+)?)
    };
    ($a:expr, $b:expr $(, $($arg:tt)+)?) => {
        $crate::__check_op!($crate::logging::LogTarget::global(), $a, $b, == $(, $($arg)+)?)
    };
}

/// Take the FATAL path unless `a != b`
#[macro_export]
macro_rules! check_ne {
    ($ctx:expr => $a:expr, $b:expr $(, $($arg:tt)+)?) => {
        $crate::__check_op!($crate::logging::LogTarget::from($ctx), $a, $b, != $(, $($arg)+)?)
    };
    ($a:expr, $b:expr $(, $($arg:tt)+)?) => {
        $crate::__check_op!($crate::logging::LogTarget::global(), $a, $b, != $(, $($arg)+)?)
    };
}

/// Take the FATAL path unless `a < b`
#[macro_export]
macro_rules! check_lt {
    ($ctx:expr => $a:expr, $b:expr $(, $($arg:tt)+)?) => {
        $crate::__check_op!($crate::logging::LogTarget::from($ctx), $a, $b, < $(, $($arg)+)?)
    };
    ($a:expr, $b:expr $(, $($arg:tt)+)?) => {
        $crate::__check_op!($crate::logging::LogTarget::global(), $a, $b, < $(, $($arg)+)?)
    };
}

/// Take the FATAL path unless `a <= b`
#[macro_export]
macro_rules! check_le {
    ($ctx:expr => $a:expr, $b:expr $(, $($arg:tt)+)?) => {
        $crate::__check_op!($crate::logging::LogTarget::from($ctx), $a, $b, <= $(, $($arg)+)?)
    };
    ($a:expr, $b:expr $(, $($arg:tt)+)?) => {
        $crate::__check_op!($crate::logging::LogTarget::global(), $a, $b, <= $(, $($arg)+)?)
    };
}

/// Take the FATAL path unless `a > b`
#[macro_export]
macro_rules! check_gt {
    ($ctx:expr => $a:expr, $b:expr $(, $($arg:tt)+)?) => {
        $crate::__check_op!($crate::logging::LogTarget::from($ctx), $a, $b, > $(, $($arg)+)?)
    };
    ($a:expr, $b:expr $(, $($arg:tt)+)?) => {
        $crate::__check_op!($crate::logging::LogTarget::global(), $a, $b, > $(, $($arg)+)?)
    };
}

/// Take the FATAL path unless `a >= b`
#[macro_export]
macro_rules! check_ge {
    ($ctx:expr => $a:expr, $b:expr $(, $($arg:tt)+)?) => {
        $crate::__check_op!($crate::logging::LogTarget::from($ctx), $a, $b, >= $(, $($arg)+)?)
    };
    ($a:expr, $b:expr $(, $($arg:tt)+)?) => {
        $crate::__check_op!($crate::logging::LogTarget::global(), $a, $b, >= $(, $($arg)+)?)
    };
}

/// Unwrap an `Option`, taking the FATAL path on `None`
///
/// # Examples
/// ```ignore
/// let conf = check_some!(registry.info("config"));
/// ```
#[macro_export]
macro_rules! check_some {
    ($ctx:expr => $opt:expr $(, $($arg:tt)+)?) => {
        $crate::__check_some!($crate::logging::LogTarget::from($ctx), $opt $(, $($arg)+)?)
    };
    ($opt:expr $(, $($arg:tt)+)?) => {
        $crate::__check_some!($crate::logging::LogTarget::global(), $opt $(, $($arg)+)?)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __check_some {
    ($target:expr, $opt:expr $(, $($arg:tt)+)?) => {
        match $opt {
            Some(value) => value,
            None => {
                let mut saver = $crate::logging::LevelLogSaver::new(
                    $target,
                    $crate::logging::Level::Fatal,
                    file!(),
                    line!(),
                );
                saver.put(concat!("check failed: ", stringify!($opt), " mustn't be None! "));
                $( saver.write_fmt(format_args!($($arg)+)); )?
                saver.fatal()
            }
        }
    };
}
