//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use biblio_core::User;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a user account
    pub fn print_user(&self, user: &User) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:      {}", user.id);
                println!("Name:    {}", user.name);
                println!("Email:   {}", user.email);
                println!("Role:    {}", user.role);
                println!("Created: {}", user.created_at.format("%Y-%m-%d %H:%M"));
            }
            OutputFormat::Json => match serde_json::to_string_pretty(user) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Failed to serialize user: {}", e),
            },
            OutputFormat::Quiet => {
                println!("{}", user.id);
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }
}
