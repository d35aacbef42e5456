use std::str::FromStr;

/// Interactive commands read from stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Start,
    Stop,
    Toggle,
    Status,
    Quit,
}

impl FromStr for Input {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" | "s" => Ok(Input::Start),
            "stop" | "x" => Ok(Input::Stop),
            "toggle" | "t" | "" => Ok(Input::Toggle),
            "status" | "?" => Ok(Input::Status),
            "quit" | "exit" | "q" => Ok(Input::Quit),
            other => Err(anyhow::anyhow!(
                "unknown command {:?}, expected start|stop|toggle|status|quit",
                other
            )),
        }
    }
}

pub const HELP: &str = "commands: start, stop, toggle (enter), status, quit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("start".parse::<Input>().unwrap(), Input::Start);
        assert_eq!(" STOP \n".parse::<Input>().unwrap(), Input::Stop);
        assert_eq!("".parse::<Input>().unwrap(), Input::Toggle);
        assert_eq!("q".parse::<Input>().unwrap(), Input::Quit);
        assert!("restart".parse::<Input>().is_err());
    }
}
