//! Which thread actions a column offers

use crate::constants::folders;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadControls {
    pub star: bool,
    pub archive: bool,
    pub restore: bool,
    pub trash: bool,
}

impl ThreadControls {
    pub fn for_column(column: &str) -> Self {
        let junk = column == folders::TRASH || column == folders::SPAM;
        Self {
            star: !junk,
            archive: !junk && column != folders::ARCHIVE,
            restore: junk,
            trash: column != folders::TRASH,
        }
    }

    /// Compact hint for the rendered board, e.g. `s a t`
    pub fn hint(&self) -> String {
        [
            (self.star, "s"),
            (self.archive, "a"),
            (self.restore, "r"),
            (self.trash, "t"),
        ]
        .iter()
        .filter(|(shown, _)| *shown)
        .map(|(_, key)| *key)
        .collect::<Vec<_>>()
        .join(" ")
    }
}
