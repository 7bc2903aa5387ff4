//! # Help Text
//!
//! Help message for the bot's commands.
//! Displayed to the user via the `help` command.

pub const MAIN: &str = concat!(
    "Roster Bot Commands:\n",
    "To enter a command, just @Mention me along with the command. No ! required!\n",
    "\n",
    "Roles:\n",
    "soldier => follows orders\n",
    "subcommand => not in charge, but helps with command\n",
    "command => in charge of the mission\n",
    "? => No role has been set\n",
    "\n",
    "Options\n",
    "join [role] => Join the roster (optionally provide a role)\n",
    "add @Player [role] => Add one or more players (optionally provide a role)\n",
    "maybe => Join the group as a 'maybe'\n",
    "addmaybe @Player => Add maybes\n",
    "leave => Leave the group\n",
    "remove @Player => Remove the tagged player(s) from the group.\n",
    "role @Player role => Assign the given role to the player(s)\n",
    "warp in => Tell me that your ship has warped in. Starts a 2hr cooldown.\n",
    "warp out => Tell me that your ship has warped out.\n",
    "list => Print a list of players on the roster.\n",
    "report => Print an availability report for the group.\n",
    "help => Print this message.\n"
);
