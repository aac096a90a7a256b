use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use crate::error::{Error, ErrorKind};

/// Item category enum.
///
/// The categories are a closed set: the database stores the snake_case code
/// and anything unrecognised is rejected at the query boundary. Adding a
/// category means adding a variant here, which makes the compiler point at
/// every match that needs updating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Assignment
    Tugas,
    /// Course material
    Materi,
    /// Midterm exam
    Uts,
    /// Final exam
    Uas,
    /// Capstone project
    TugasAkhir,
    /// Lab assignment
    TugasPraktikum,
    /// Pre-lab assignment
    TugasPraPraktikum,
    /// Lab midterm
    UtsPraktikum,
    /// Lab final
    UasPraktikum,
}

impl ItemKind {
    /// The snake_case code as stored in the database.
    pub fn code(&self) -> &'static str {
        match self {
            ItemKind::Tugas => "tugas",
            ItemKind::Materi => "materi",
            ItemKind::Uts => "uts",
            ItemKind::Uas => "uas",
            ItemKind::TugasAkhir => "tugas_akhir",
            ItemKind::TugasPraktikum => "tugas_praktikum",
            ItemKind::TugasPraPraktikum => "tugas_pra_praktikum",
            ItemKind::UtsPraktikum => "uts_praktikum",
            ItemKind::UasPraktikum => "uas_praktikum",
        }
    }

    /// The human-readable label shown in the archive tree.
    ///
    /// Labels are the code with each word capitalised and underscores
    /// replaced by spaces. A test pins this mapping against the generic
    /// formatter so the two can never drift apart.
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Tugas => "Tugas",
            ItemKind::Materi => "Materi",
            ItemKind::Uts => "Uts",
            ItemKind::Uas => "Uas",
            ItemKind::TugasAkhir => "Tugas Akhir",
            ItemKind::TugasPraktikum => "Tugas Praktikum",
            ItemKind::TugasPraPraktikum => "Tugas Pra Praktikum",
            ItemKind::UtsPraktikum => "Uts Praktikum",
            ItemKind::UasPraktikum => "Uas Praktikum",
        }
    }

    /// Every variant, in no particular order of importance.
    pub const ALL: [ItemKind; 9] = [
        ItemKind::Tugas,
        ItemKind::Materi,
        ItemKind::Uts,
        ItemKind::Uas,
        ItemKind::TugasAkhir,
        ItemKind::TugasPraktikum,
        ItemKind::TugasPraPraktikum,
        ItemKind::UtsPraktikum,
        ItemKind::UasPraktikum,
    ];
}

impl FromStr for ItemKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "tugas" => Self::Tugas,
            "materi" => Self::Materi,
            "uts" => Self::Uts,
            "uas" => Self::Uas,
            "tugas_akhir" => Self::TugasAkhir,
            "tugas_praktikum" => Self::TugasPraktikum,
            "tugas_pra_praktikum" => Self::TugasPraPraktikum,
            "uts_praktikum" => Self::UtsPraktikum,
            "uas_praktikum" => Self::UasPraktikum,
            _ => exn::bail!(ErrorKind::InvalidData("item kind")),
        })
    }
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.code())
    }
}

/// Content block kind: a paragraph of text or an image with caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Text,
    Image,
}

impl BlockKind {
    pub fn code(&self) -> &'static str {
        match self {
            BlockKind::Text => "text",
            BlockKind::Image => "image",
        }
    }
}

impl FromStr for BlockKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "text" => Self::Text,
            "image" => Self::Image,
            _ => exn::bail!(ErrorKind::InvalidData("block kind")),
        })
    }
}

impl Display for BlockKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ItemKind::Tugas, "tugas", "Tugas")]
    #[case(ItemKind::TugasPraPraktikum, "tugas_pra_praktikum", "Tugas Pra Praktikum")]
    #[case(ItemKind::UasPraktikum, "uas_praktikum", "Uas Praktikum")]
    fn test_item_kind_code_and_label(#[case] kind: ItemKind, #[case] code: &str, #[case] label: &str) {
        assert_eq!(kind.code(), code);
        assert_eq!(kind.label(), label);
    }

    #[test]
    fn test_item_kind_code_round_trip() {
        for kind in ItemKind::ALL {
            assert_eq!(kind.code().parse::<ItemKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!("quiz".parse::<ItemKind>().is_err());
        assert!("".parse::<ItemKind>().is_err());
        assert!("header".parse::<BlockKind>().is_err());
    }
}
