use clap::{Arg, ArgAction, Command, value_parser};

pub fn build_cli() -> Command {
    Command::new("consolepanel")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Remote control panel for desktop console windows")
        .long_about("ConsolePanel lists console windows, captures their live contents, and types text or key presses into them through external OS-automation tools. Run 'consolepanel serve' to expose the tools over HTTP, or use the one-shot commands locally.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable logging output (-vv for debug)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("serve")
                .about("Run the HTTP orchestration server")
                .arg(
                    Arg::new("bind")
                        .long("bind")
                        .help("Address to listen on (overrides config)")
                )
                .arg(
                    Arg::new("port")
                        .long("port")
                        .short('p')
                        .help("Port to listen on (overrides config and PORT)")
                        .value_parser(value_parser!(u16).range(1..))
                )
        )
        .subcommand(
            Command::new("list")
                .about("List console windows")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Output in JSON format")
                        .action(ArgAction::SetTrue)
                )
        )
        .subcommand(
            Command::new("capture")
                .about("Capture a window to a PNG file")
                .arg(handle_arg())
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Output file (default: <handle>.png in the current directory)")
                )
        )
        .subcommand(
            Command::new("focus")
                .about("Bring a window to the foreground")
                .arg(handle_arg())
        )
        .subcommand(
            Command::new("type")
                .about("Type text into a window")
                .arg(handle_arg())
                .arg(
                    Arg::new("text")
                        .help("Text to type")
                        .required(true)
                        .allow_hyphen_values(true)
                        .index(2)
                )
        )
        .subcommand(
            Command::new("key")
                .about("Send a key or chord such as 'enter' or 'ctrl+c'")
                .arg(handle_arg())
                .arg(
                    Arg::new("key")
                        .help("Key specification, '+'-joined")
                        .required(true)
                        .index(2)
                )
        )
        .subcommand(
            Command::new("kill")
                .about("Close a window")
                .arg(handle_arg())
        )
        .subcommand(
            Command::new("new")
                .about("Open a new console window")
                .arg(
                    Arg::new("command")
                        .long("command")
                        .short('c')
                        .allow_hyphen_values(true)
                        .help("Command to run in the new console")
                )
                .arg(
                    Arg::new("title")
                        .long("title")
                        .short('t')
                        .help("Window title")
                )
                .arg(
                    Arg::new("directory")
                        .long("directory")
                        .short('d')
                        .help("Working directory")
                )
        )
        .subcommand(
            Command::new("ls")
                .about("List subdirectories on the host (folder picker)")
                .arg(
                    Arg::new("path")
                        .help("Directory to list (default: the tool's starting directory)")
                        .index(1)
                )
        )
        .subcommand(
            Command::new("star")
                .about("Star a window in local preferences")
                .arg(handle_arg())
                .arg(
                    Arg::new("off")
                        .long("off")
                        .help("Remove the star instead")
                        .action(ArgAction::SetTrue)
                )
        )
        .subcommand(
            Command::new("nick")
                .about("Set or clear a window's nickname")
                .arg(handle_arg())
                .arg(
                    Arg::new("name")
                        .help("Nickname; omit to clear")
                        .index(2)
                )
        )
        .subcommand(
            Command::new("watch")
                .about("Poll windows and keep fresh captures on disk")
                .arg(
                    Arg::new("server")
                        .long("server")
                        .short('s')
                        .help("Base URL of a ConsolePanel server (default: run tools locally)")
                )
                .arg(
                    Arg::new("expand")
                        .long("expand")
                        .short('e')
                        .help("Refresh this window at the expanded interval (repeatable)")
                        .action(ArgAction::Append)
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .help("Directory for captured images")
                        .default_value("captures")
                )
                .arg(
                    Arg::new("once")
                        .long("once")
                        .help("Exit after one capture of every listed window")
                        .action(ArgAction::SetTrue)
                )
        )
}

fn handle_arg() -> Arg {
    Arg::new("handle")
        .help("Window handle, as shown by 'consolepanel list'")
        .required(true)
        .index(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_build() {
        let app = build_cli();
        assert_eq!(app.get_name(), "consolepanel");
    }

    #[test]
    fn test_cli_verbose_counts() {
        let app = build_cli();
        let matches = app
            .try_get_matches_from(vec!["consolepanel", "-vv", "list"])
            .unwrap();
        assert_eq!(matches.get_count("verbose"), 2);

        let app = build_cli();
        let matches = app
            .try_get_matches_from(vec!["consolepanel", "list", "-v"])
            .unwrap();
        assert_eq!(matches.get_count("verbose"), 1);
    }

    #[test]
    fn test_cli_requires_subcommand() {
        let app = build_cli();
        assert!(app.try_get_matches_from(vec!["consolepanel"]).is_err());
    }

    #[test]
    fn test_cli_type_accepts_hyphen_text() {
        let app = build_cli();
        let matches = app
            .try_get_matches_from(vec!["consolepanel", "type", "0xAB", "-la"])
            .unwrap();
        let type_matches = matches.subcommand_matches("type").unwrap();
        assert_eq!(type_matches.get_one::<String>("handle").unwrap(), "0xAB");
        assert_eq!(type_matches.get_one::<String>("text").unwrap(), "-la");
    }

    #[test]
    fn test_cli_key_requires_key() {
        let app = build_cli();
        assert!(
            app.try_get_matches_from(vec!["consolepanel", "key", "0xAB"])
                .is_err()
        );
    }

    #[test]
    fn test_cli_serve_port() {
        let app = build_cli();
        let matches = app
            .try_get_matches_from(vec!["consolepanel", "serve", "--port", "9000"])
            .unwrap();
        let serve = matches.subcommand_matches("serve").unwrap();
        assert_eq!(serve.get_one::<u16>("port"), Some(&9000));

        let app = build_cli();
        assert!(
            app.try_get_matches_from(vec!["consolepanel", "serve", "--port", "0"])
                .is_err()
        );
    }

    #[test]
    fn test_cli_watch_repeated_expand() {
        let app = build_cli();
        let matches = app
            .try_get_matches_from(vec![
                "consolepanel",
                "watch",
                "--expand",
                "0x10",
                "-e",
                "0x20",
                "--once",
            ])
            .unwrap();
        let watch = matches.subcommand_matches("watch").unwrap();
        let expand: Vec<&String> = watch.get_many::<String>("expand").unwrap().collect();
        assert_eq!(expand, ["0x10", "0x20"]);
        assert!(watch.get_flag("once"));
        assert_eq!(watch.get_one::<String>("out").unwrap(), "captures");
    }

    #[test]
    fn test_cli_new_all_optional() {
        let app = build_cli();
        let matches = app
            .try_get_matches_from(vec!["consolepanel", "new"])
            .unwrap();
        let new = matches.subcommand_matches("new").unwrap();
        assert!(new.get_one::<String>("command").is_none());
    }

    #[test]
    fn test_cli_nick_name_optional() {
        let app = build_cli();
        let matches = app
            .try_get_matches_from(vec!["consolepanel", "nick", "0xAB"])
            .unwrap();
        let nick = matches.subcommand_matches("nick").unwrap();
        assert!(nick.get_one::<String>("name").is_none());
    }
}
