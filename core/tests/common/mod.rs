#![allow(dead_code)]

use std::collections::HashMap;

use cmdforge_core::{EmittedResource, PackConfig};

pub fn config() -> PackConfig {
    PackConfig::new("demo")
}

/// Body of the function `name` (`ns:path`) among `resources`.
pub fn function_text(resources: &[EmittedResource], name: &str) -> Option<String> {
    resources
        .iter()
        .find(|r| r.extension == "mcfunction" && r.path.to_string() == name)
        .and_then(|r| r.content.as_text().map(str::to_string))
}

pub fn function_lines(resources: &[EmittedResource], name: &str) -> Vec<String> {
    function_text(resources, name)
        .map(|text| text.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

pub fn function_names(resources: &[EmittedResource]) -> Vec<String> {
    resources
        .iter()
        .filter(|r| r.extension == "mcfunction")
        .map(|r| r.path.to_string())
        .collect()
}

/// Runs the subset of commands the flow lowering produces: score sets,
/// `execute if|unless score .. matches ..` guards, function calls and `say`.
pub struct Machine {
    functions: HashMap<String, Vec<String>>,
    pub scores: HashMap<String, i32>,
    pub said: Vec<String>,
    pub calls: Vec<String>,
}

impl Machine {
    pub fn new(resources: &[EmittedResource]) -> Self {
        let functions = resources
            .iter()
            .filter(|r| r.extension == "mcfunction")
            .map(|r| {
                let lines = r
                    .content
                    .as_text()
                    .unwrap_or_default()
                    .lines()
                    .map(str::to_string)
                    .collect();
                (r.path.to_string(), lines)
            })
            .collect();
        Machine { functions, scores: HashMap::new(), said: Vec::new(), calls: Vec::new() }
    }

    pub fn set_score(&mut self, holder: &str, objective: &str, value: i32) {
        self.scores.insert(format!("{} {}", holder, objective), value);
    }

    pub fn run(&mut self, function: &str) {
        self.calls.push(function.to_string());
        let lines = self.functions.get(function).cloned().unwrap_or_else(|| panic!("no function {}", function));
        for line in lines {
            self.exec(&line);
        }
    }

    fn exec(&mut self, line: &str) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["say", rest @ ..] => self.said.push(rest.join(" ")),
            ["function", name] => self.run(name),
            ["scoreboard", "players", "set", holder, objective, value] => {
                self.set_score(holder, objective, value.parse().expect("score value"));
            }
            ["execute", rest @ ..] => self.execute(rest),
            _ => panic!("unsupported command: {}", line),
        }
    }

    fn execute(&mut self, mut tokens: &[&str]) {
        loop {
            match tokens {
                [keyword @ ("if" | "unless"), "score", holder, objective, "matches", range, rest @ ..] => {
                    let value = self.scores.get(&format!("{} {}", holder, objective)).copied();
                    let holds = value.map(|v| in_range(v, range)).unwrap_or(false);
                    if holds != (*keyword == "if") {
                        return;
                    }
                    tokens = rest;
                }
                ["run", rest @ ..] => {
                    self.exec(&rest.join(" "));
                    return;
                }
                _ => panic!("unsupported execute form: {:?}", tokens),
            }
        }
    }
}

fn in_range(value: i32, range: &str) -> bool {
    match range.split_once("..") {
        None => value == range.parse::<i32>().expect("range"),
        Some((low, high)) => {
            let above = low.is_empty() || value >= low.parse::<i32>().expect("range");
            let below = high.is_empty() || value <= high.parse::<i32>().expect("range");
            above && below
        }
    }
}
