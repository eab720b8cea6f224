use std::fmt::Display;
use std::sync::{Arc, Mutex};

/// Lines captured by a buffered [`Printer`].
#[derive(Clone, Default)]
pub struct OutputBuffer(Arc<Mutex<Vec<String>>>);

impl OutputBuffer {
    /// Remove and return all captured lines.
    pub fn take(&self) -> Vec<String> {
        match self.0.lock() {
            Ok(mut lines) => std::mem::take(&mut *lines),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    /// Captured output joined with newlines (buffer is left untouched).
    pub fn contents(&self) -> String {
        match self.0.lock() {
            Ok(lines) => lines.join("\n"),
            Err(poisoned) => poisoned.into_inner().join("\n"),
        }
    }

    fn push(&self, line: String) {
        match self.0.lock() {
            Ok(mut lines) => lines.push(line),
            Err(poisoned) => poisoned.into_inner().push(line),
        }
    }
}

enum Sink {
    Stdout,
    Buffer(OutputBuffer),
}

/// Shell output. Writes into stdout or, for tests and embedding, into a shared buffer.
pub struct Printer {
    sink: Sink,
}

impl Default for Printer {
    fn default() -> Self {
        Self::stdout()
    }
}

impl Printer {
    pub fn stdout() -> Self {
        Self { sink: Sink::Stdout }
    }

    pub fn buffered() -> (Self, OutputBuffer) {
        let buffer = OutputBuffer::default();
        (
            Self {
                sink: Sink::Buffer(buffer.clone()),
            },
            buffer,
        )
    }

    /// Print a message, a message may contain several lines.
    pub fn println(&self, msg: impl Display) {
        let msg = msg.to_string();
        match &self.sink {
            Sink::Stdout => println!("{msg}"),
            Sink::Buffer(buffer) => msg
                .split('\n')
                .for_each(|line| buffer.push(line.to_string())),
        }
    }
}

pub mod style {
    use crossterm::style::{Color, Stylize};
    use std::fmt::{Display, Formatter};
    use std::sync::atomic::{AtomicBool, Ordering};

    const UNKNOWN_PLACEHOLDER: &str = "?";

    static COLORED: AtomicBool = AtomicBool::new(false);

    /// Enable or disable colored output for all views.
    pub fn set_colored(colored: bool) {
        COLORED.store(colored, Ordering::Relaxed)
    }

    pub fn is_colored() -> bool {
        !cfg!(feature = "int_test") && COLORED.load(Ordering::Relaxed)
    }

    struct View<T: Display> {
        inner: Option<T>,
        color: Color,
    }

    impl<T: Display> Display for View<T> {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            let text = self
                .inner
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| UNKNOWN_PLACEHOLDER.to_string());

            if is_colored() {
                f.write_fmt(format_args!("{}", text.with(self.color)))
            } else {
                f.write_str(&text)
            }
        }
    }

    /// Construct structure declaration to display data of the same type (file paths, addresses, etc.).
    /// A display style is reset if colors are off or program compiled with `int_test` feature.
    macro_rules! view_struct {
        ($name: ident, $color: expr) => {
            pub struct $name<T: Display>(View<T>);

            impl<T: Display> From<T> for $name<T> {
                fn from(value: T) -> Self {
                    Self(View {
                        inner: Some(value),
                        color: $color,
                    })
                }
            }

            impl<T: Display> From<Option<T>> for $name<T> {
                fn from(value: Option<T>) -> Self {
                    Self(View {
                        inner: value,
                        color: $color,
                    })
                }
            }

            impl<T: Display> Display for $name<T> {
                fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                    self.0.fmt(f)
                }
            }
        };
    }

    view_struct!(AddressView, Color::Blue);
    view_struct!(FilePathView, Color::Green);
    view_struct!(FunctionNameView, Color::Yellow);
    view_struct!(KeywordView, Color::Magenta);
    view_struct!(ErrorView, Color::Red);
}
