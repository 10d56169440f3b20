//! Line commands understood by `bookgate shell`

use super::OutputFormat;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Status(OutputFormat),
    Login { email: String },
    Register { email: String, name: String },
    Logout,
    Google,
    Open { path: String },
    Chat { message: String },
    Token,
    Help,
    Quit,
    Empty,
}

pub const HELP: &str = "\
Commands:
  status [table|json|yaml]   Show the session
  login <email>              Sign in (password is prompted)
  register <email> <name>    Create an account (password is prompted)
  logout                     Sign out here and in every other shell
  google                     Start Google sign-in
  open <path>                Check whether a page would be shown
  chat <message>             Ask the book assistant
  token                      Show the current access token's claims
  help                       Show this help
  quit                       Leave the shell";

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command.to_lowercase().as_str() {
            "" => Ok(ShellCommand::Empty),
            "status" => {
                let format = match rest {
                    "" | "table" => OutputFormat::Table,
                    "json" => OutputFormat::Json,
                    "yaml" => OutputFormat::Yaml,
                    other => return Err(format!("Unknown format: {}", other)),
                };
                Ok(ShellCommand::Status(format))
            }
            "login" => {
                if rest.is_empty() || rest.contains(char::is_whitespace) {
                    return Err("Usage: login <email>".to_string());
                }
                Ok(ShellCommand::Login {
                    email: rest.to_string(),
                })
            }
            "register" => match rest.split_once(char::is_whitespace) {
                Some((email, name)) if !name.trim().is_empty() => Ok(ShellCommand::Register {
                    email: email.to_string(),
                    name: name.trim().to_string(),
                }),
                _ => Err("Usage: register <email> <name>".to_string()),
            },
            "logout" => Ok(ShellCommand::Logout),
            "google" => Ok(ShellCommand::Google),
            "open" => {
                if rest.is_empty() {
                    return Err("Usage: open <path>".to_string());
                }
                let path = if rest.starts_with('/') {
                    rest.to_string()
                } else {
                    format!("/{}", rest)
                };
                Ok(ShellCommand::Open { path })
            }
            "chat" => {
                if rest.is_empty() {
                    return Err("Usage: chat <message>".to_string());
                }
                Ok(ShellCommand::Chat {
                    message: rest.to_string(),
                })
            }
            "token" => Ok(ShellCommand::Token),
            "help" | "?" => Ok(ShellCommand::Help),
            "quit" | "exit" => Ok(ShellCommand::Quit),
            other => Err(format!("Unknown command: {} (try 'help')", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(ShellCommand::parse("  "), Ok(ShellCommand::Empty));
        assert_eq!(ShellCommand::parse("logout"), Ok(ShellCommand::Logout));
        assert_eq!(ShellCommand::parse("GOOGLE"), Ok(ShellCommand::Google));
        assert_eq!(ShellCommand::parse("exit"), Ok(ShellCommand::Quit));
        assert_eq!(ShellCommand::parse("?"), Ok(ShellCommand::Help));
    }

    #[test]
    fn test_parse_status_format() {
        assert_eq!(
            ShellCommand::parse("status"),
            Ok(ShellCommand::Status(OutputFormat::Table))
        );
        assert_eq!(
            ShellCommand::parse("status yaml"),
            Ok(ShellCommand::Status(OutputFormat::Yaml))
        );
        assert!(ShellCommand::parse("status xml").is_err());
    }

    #[test]
    fn test_parse_login_and_register() {
        assert_eq!(
            ShellCommand::parse("login a@b.com"),
            Ok(ShellCommand::Login {
                email: "a@b.com".to_string()
            })
        );
        assert!(ShellCommand::parse("login").is_err());
        assert_eq!(
            ShellCommand::parse("register ada@example.com Ada Lovelace"),
            Ok(ShellCommand::Register {
                email: "ada@example.com".to_string(),
                name: "Ada Lovelace".to_string()
            })
        );
        assert!(ShellCommand::parse("register ada@example.com").is_err());
    }

    #[test]
    fn test_parse_open_adds_leading_slash() {
        assert_eq!(
            ShellCommand::parse("open docs/intro"),
            Ok(ShellCommand::Open {
                path: "/docs/intro".to_string()
            })
        );
    }

    #[test]
    fn test_parse_chat_keeps_message() {
        assert_eq!(
            ShellCommand::parse("chat What is   an agent?"),
            Ok(ShellCommand::Chat {
                message: "What is   an agent?".to_string()
            })
        );
        assert!(ShellCommand::parse("chat").is_err());
    }

    #[test]
    fn test_unknown_command() {
        assert!(ShellCommand::parse("dance").unwrap_err().contains("Unknown command"));
    }
}
