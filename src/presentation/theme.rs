use colored::Colorize;

pub struct Theme {
    pub title: fn(&str) -> String,
    pub lang: fn(&str) -> String,
    pub line: fn(&str) -> String,
    pub service: fn(&str) -> String,
    pub result: fn(&str) -> String,
    pub meta: fn(&str) -> String,
    pub error: fn(&str) -> String,
}

impl Theme {
    pub fn from_name(name: &str) -> Self {
        match name {
            "temp" | "" => Self::temp(),
            "wudao" => Self::wudao(),
            "canvas" => Self::canvas(),
            _ => {
                eprintln!("{}", format!("✘ Unknown theme: {}", name).red());
                Self::temp() // Fallback to default
            }
        }
    }

    fn temp() -> Self {
        Self {
            title: |s| s.bright_magenta().italic().bold().to_string(),
            lang: |s| s.cyan().to_string(),
            line: |s| s.bright_black().dimmed().to_string(),
            service: |s| s.yellow().bold().to_string(),
            result: |s| s.white().to_string(),
            meta: |s| s.bright_white().dimmed().italic().to_string(),
            error: |s| s.red().to_string(),
        }
    }

    fn wudao() -> Self {
        Self {
            title: |s| s.red().italic().bold().to_string(),
            lang: |s| s.cyan().to_string(),
            line: |s| s.bright_black().dimmed().to_string(),
            service: |s| s.green().italic().to_string(),
            result: |s| s.bright_white().to_string(),
            meta: |s| s.bright_yellow().dimmed().italic().to_string(),
            error: |s| s.red().italic().to_string(),
        }
    }

    fn canvas() -> Self {
        Self {
            title: |s| s.blue().bold().to_string(),
            lang: |s| s.magenta().to_string(),
            line: |s| s.bright_black().dimmed().to_string(),
            service: |s| s.bright_cyan().bold().to_string(),
            result: |s| s.black().to_string(),
            meta: |s| s.bright_black().italic().to_string(),
            error: |s| s.red().bold().to_string(),
        }
    }
}
