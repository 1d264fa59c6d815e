//! robots.txt parsing and path matching.
//!
//! The parser keeps groups in file order: consecutive `User-agent` lines
//! extend one group, and a `User-agent` line that appears after rule lines
//! starts a new group. Matching follows longest-path-wins, with `Allow`
//! beating `Disallow` on exact-length ties.

#[derive(Debug, Clone)]
struct Rule {
    allow: bool,
    path: String,
}

impl Rule {
    fn matches(&self, path: &str) -> bool {
        if let Some(exact) = self.path.strip_suffix('$') {
            path == exact
        } else if let Some(prefix) = self.path.strip_suffix('*') {
            path.starts_with(prefix)
        } else {
            path.starts_with(&self.path)
        }
    }
}

#[derive(Debug, Clone)]
struct Group {
    user_agents: Vec<String>,
    rules: Vec<Rule>,
}

/// Parsed robots.txt directives for any number of user agents.
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    groups: Vec<Group>,
}

impl RobotsRules {
    /// Parses robots.txt text. Lines that fit no known directive are
    /// ignored, as are empty `Allow`/`Disallow` values.
    pub fn parse(text: &str) -> Self {
        let mut groups: Vec<Group> = Vec::new();
        let mut collecting_agents = false;

        for raw in text.lines() {
            let line = match raw.split_once('#') {
                Some((head, _)) => head,
                None => raw,
            }
            .trim();
            if line.is_empty() {
                continue;
            }
            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            let directive = directive.trim().to_ascii_lowercase();
            let value = value.trim();

            match directive.as_str() {
                "user-agent" => {
                    if collecting_agents {
                        if let Some(group) = groups.last_mut() {
                            group.user_agents.push(value.to_ascii_lowercase());
                        }
                    } else {
                        groups.push(Group {
                            user_agents: vec![value.to_ascii_lowercase()],
                            rules: Vec::new(),
                        });
                        collecting_agents = true;
                    }
                }
                "allow" | "disallow" => {
                    collecting_agents = false;
                    if value.is_empty() {
                        continue;
                    }
                    if let Some(group) = groups.last_mut() {
                        group.rules.push(Rule {
                            allow: directive == "allow",
                            path: value.to_string(),
                        });
                    }
                }
                _ => {}
            }
        }

        Self { groups }
    }

    /// Whether `path` may be fetched by `user_agent`. A path no rule matches,
    /// an agent no group covers, or an empty file all mean "allowed".
    pub fn is_allowed(&self, user_agent: &str, path: &str) -> bool {
        let Some(group) = self.group_for(user_agent) else {
            return true;
        };

        let mut best: Option<(usize, bool)> = None;
        for rule in &group.rules {
            if !rule.matches(path) {
                continue;
            }
            let specificity = rule.path.len();
            match best {
                None => best = Some((specificity, rule.allow)),
                Some((len, allow)) => {
                    if specificity > len || (specificity == len && rule.allow && !allow) {
                        best = Some((specificity, rule.allow));
                    }
                }
            }
        }
        best.is_none_or(|(_, allow)| allow)
    }

    fn group_for(&self, user_agent: &str) -> Option<&Group> {
        let agent = user_agent.to_ascii_lowercase();
        self.groups
            .iter()
            .find(|g| g.user_agents.iter().any(|ua| *ua == agent))
            .or_else(|| {
                self.groups
                    .iter()
                    .find(|g| g.user_agents.iter().any(|ua| ua == "*"))
            })
    }
}
