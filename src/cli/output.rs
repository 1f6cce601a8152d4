//! Terminal output for commands.

use console::Style;

/// Styles used by command output.
#[derive(Debug, Clone)]
pub struct Theme {
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub header: Style,
    pub dim: Style,
}

impl Theme {
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            header: Style::new().bold().magenta(),
            dim: Style::new().dim(),
        }
    }

    /// A theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            header: Style::new(),
            dim: Style::new(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    console::Term::stdout().is_term()
}

/// Writes command results to stdout and problems to stderr.
///
/// Quiet mode drops headers and status lines but keeps data and errors,
/// so piped output stays usable.
#[derive(Debug, Clone)]
pub struct Output {
    theme: Theme,
    quiet: bool,
}

impl Output {
    pub fn new(quiet: bool, colors: bool) -> Self {
        let theme = if colors { Theme::new() } else { Theme::plain() };
        Self { theme, quiet }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn header(&self, title: &str) {
        if !self.quiet {
            println!("{}", self.theme.header.apply_to(title));
        }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", self.theme.success.apply_to("✓"), message);
        }
    }

    pub fn message(&self, message: &str) {
        if !self.quiet {
            println!("{}", self.theme.dim.apply_to(message));
        }
    }

    /// A data line, printed even in quiet mode.
    pub fn item(&self, item: &str) {
        if self.quiet {
            println!("{item}");
        } else {
            println!("  {item}");
        }
    }

    /// Raw text, printed even in quiet mode.
    pub fn raw(&self, text: &str) {
        println!("{text}");
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{} {}", self.theme.warning.apply_to("!"), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", self.theme.error.apply_to("✗"), message);
    }
}
