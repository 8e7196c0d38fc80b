use anyhow::{anyhow, Context};
use std::io::IsTerminal;
use std::process::Stdio;

/// Render a command line for display, quoting where a shell would need it
pub fn display_command(args: &[String]) -> String {
    args.iter()
        .map(|arg| shell_quote(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./,:=@+%".contains(c));

    if plain {
        arg.to_owned()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Run `args[0]` with the remaining arguments.
///
/// In a TTY the child talks to the terminal directly, otherwise its output
/// is captured and echoed.
pub fn spawn_command(args: &[String]) -> anyhow::Result<()> {
    let (program, rest) = args
        .split_first()
        .ok_or_else(|| anyhow!("No command provided"))?;

    log::debug!("spawn_command: {}", display_command(args));

    let mut command = std::process::Command::new(program);
    command.args(rest);

    let is_tty = std::io::stdin().is_terminal() && std::io::stdout().is_terminal();

    let status = if is_tty {
        command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        command
            .status()
            .with_context(|| format!("failed to execute {}", program))?
            .code()
    } else {
        let output = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("failed to execute {}", program))?;

        if !output.stdout.is_empty() {
            print!("{}", String::from_utf8_lossy(&output.stdout));
        }
        if !output.stderr.is_empty() {
            eprint!("{}", String::from_utf8_lossy(&output.stderr));
        }

        output.status.code()
    };

    match status.unwrap_or(1) {
        0 => Ok(()),
        code => Err(anyhow!(
            "Command exited with code {}: {}",
            code,
            display_command(args)
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_display_command() {
        let args = strings(&["ssh", "-p", "29418", "host", "--message", "\"fine by me\"", ""]);
        assert_eq!(
            display_command(&args),
            r#"ssh -p 29418 host --message '"fine by me"' ''"#
        );
        assert_eq!(display_command(&strings(&["it's"])), r"'it'\''s'");
    }

    #[test]
    fn test_spawn_command() {
        assert!(spawn_command(&strings(&["true"])).is_ok());

        let err = spawn_command(&strings(&["false"])).unwrap_err();
        assert_eq!(err.to_string(), "Command exited with code 1: false");

        assert!(spawn_command(&[]).is_err());
        assert!(spawn_command(&strings(&["verdict-no-such-program"])).is_err());
    }
}
