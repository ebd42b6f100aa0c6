use std::io::{self, BufRead, Write};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Backup,
    Download,
    Exit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "B" => Ok(Command::Backup),
            "D" => Ok(Command::Download),
            "E" => Ok(Command::Exit),
            other => Err(format!("unknown command: {other}")),
        }
    }
}

pub const MENU: &str = " [•] B - Backup\n [•] D - Download\n [•] E - Exit";

/// Shows the menu and reads commands until a valid one is entered.
/// End of input counts as `Exit`.
pub fn choose_command<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<Command> {
    writeln!(output, "{MENU}")?;
    loop {
        write!(output, " [•] Enter the command: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(Command::Exit);
        }
        match line.parse() {
            Ok(command) => return Ok(command),
            Err(_) => writeln!(output, " [•] Unknown command... Try again.")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &str) -> (Command, String) {
        let mut output = Vec::new();
        let command = choose_command(&mut input.as_bytes(), &mut output).unwrap();
        (command, String::from_utf8(output).unwrap())
    }

    #[test]
    fn parses_menu_letters() {
        assert_eq!("B".parse::<Command>(), Ok(Command::Backup));
        assert_eq!(" D\n".parse::<Command>(), Ok(Command::Download));
        assert_eq!("E".parse::<Command>(), Ok(Command::Exit));
        assert!("backup".parse::<Command>().is_err());
    }

    #[test]
    fn lowercase_letters_are_unknown() {
        assert!("b".parse::<Command>().is_err());
        let (command, output) = run("b\nE\n");
        assert_eq!(command, Command::Exit);
        assert_eq!(output.matches("Unknown command").count(), 1);
    }

    #[test]
    fn reprompts_on_unknown_input() {
        let (command, output) = run("x\n\nB\n");

        assert_eq!(command, Command::Backup);
        assert_eq!(output.matches("Unknown command").count(), 2);
        assert_eq!(output.matches("Enter the command").count(), 3);
        assert!(output.starts_with(MENU));
    }

    #[test]
    fn end_of_input_exits() {
        let (command, _) = run("q\n");
        assert_eq!(command, Command::Exit);
    }
}
