//! # Roster Formatter
//!
//! Renders the `list` and `report` views as fixed-width text inside a code
//! fence so columns line up in any chat client.

use crate::domain::types::{ListRow, ReportRow};

pub struct RosterFormatter;

impl RosterFormatter {
    pub fn format_list(group_name: &str, rows: &[ListRow], maybes: &[String]) -> String {
        let mut output = format!(
            "```\n({})The following players are joining the {}.\n\n",
            rows.len(),
            group_name
        );
        for row in rows {
            let role = format!("[{}]", row.role);
            output.push_str(&format!("{:<15}{}\n", role, row.username));
        }

        output.push_str(&format!(
            "\n({})The following players are 'maybe'.\n\n",
            maybes.len()
        ));
        for name in maybes {
            output.push_str(name);
            output.push('\n');
        }
        output.push_str("\n```");
        output
    }

    pub fn format_report(rows: &[ReportRow]) -> String {
        let mut output = String::from("```\nThe following players are in the group:\n");
        for row in rows {
            let status = format!("Status[{}]", row.status);
            let cooldown = format!("Cooldown[{} min]", row.cooldown_minutes);
            let ready = format!("RocketsReady[{}]", row.resources);
            output.push_str(&format!(
                "{:<17}{:<17}{:<18}{:<16}\n",
                row.username, status, cooldown, ready
            ));
        }
        output.push_str("```");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{Role, Status};

    #[test]
    fn test_format_list() {
        let rows = vec![
            ListRow {
                username: "alice".to_string(),
                role: Role::Command,
            },
            ListRow {
                username: "bob".to_string(),
                role: Role::Unknown,
            },
        ];
        let out = RosterFormatter::format_list("White Star", &rows, &["carol".to_string()]);
        assert_eq!(
            out,
            "```\n(2)The following players are joining the White Star.\n\n\
             [command]      alice\n\
             [?]            bob\n\
             \n(1)The following players are 'maybe'.\n\n\
             carol\n\
             \n```"
        );
    }

    #[test]
    fn test_format_report_columns() {
        let rows = vec![ReportRow {
            username: "alice".to_string(),
            status: Status::Inside,
            cooldown_minutes: 75,
            resources: 1,
        }];
        let out = RosterFormatter::format_report(&rows);
        let line = out.lines().nth(2).unwrap();
        assert_eq!(
            line,
            "alice            Status[Inside]   Cooldown[75 min]  RocketsReady[1] "
        );
        assert!(out.starts_with("```\nThe following players are in the group:\n"));
        assert!(out.ends_with("```"));
    }

    #[test]
    fn test_format_report_empty() {
        assert_eq!(
            RosterFormatter::format_report(&[]),
            "```\nThe following players are in the group:\n```"
        );
    }
}
