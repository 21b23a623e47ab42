use itertools::Itertools;
use serde::Serialize;
use std::fmt::{self, Display, Formatter};
use std::panic::Location;
use thiserror::Error;

/// A single field of a structured DRAM address.
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    /// Channel
    Channel,
    /// Rank
    Rank,
    /// Bank group
    BankGroup,
    /// Bank within a bank group
    Bank,
    /// Row
    Row,
    /// Column (burst granularity)
    Column,
}

impl Field {
    /// All fields, in structured-address order.
    pub const ALL: [Field; 6] = [
        Field::Channel,
        Field::Rank,
        Field::BankGroup,
        Field::Bank,
        Field::Row,
        Field::Column,
    ];

    /// The two-character token naming this field in a mapping scheme.
    pub fn token(&self) -> &'static str {
        match self {
            Field::Channel => "ch",
            Field::Rank => "ra",
            Field::BankGroup => "bg",
            Field::Bank => "ba",
            Field::Row => "ro",
            Field::Column => "co",
        }
    }

    /// Looks up a field by its two-character token.
    pub fn from_token(token: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.token() == token)
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let name = match self {
            Field::Channel => "channel",
            Field::Rank => "rank",
            Field::BankGroup => "bankgroup",
            Field::Bank => "bank",
            Field::Row => "row",
            Field::Column => "column",
        };
        f.write_str(name)
    }
}

/// Error returned for a mapping scheme name that is not supported.
#[derive(Debug, Error)]
#[error("Unknown address mapping {name:?} (detected at {location})")]
pub struct UnknownMapping {
    /// The rejected scheme name
    pub name: String,
    /// Source location that rejected the name
    pub location: &'static Location<'static>,
}

/// Ordering of structured-address fields inside a linear address.
///
/// The scheme name lists the fields most significant first, e.g. `chrarocobabg`
/// places the bank group directly above the throwaway bits and the channel at
/// the top.
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum AddressMapping {
    /// channel:rank:row:column:bank:bankgroup
    ChRaRoCoBaBg,
    /// channel:row:column:bank:bankgroup:rank
    ChRoCoBaBgRa,
    /// channel:rank:bank:bankgroup:column:row
    ChRaBaBgCoRo,
    /// channel:rank:bank:bankgroup:row:column
    ChRaBaBgRoCo,
    /// channel:row:column:rank:bank:bankgroup
    ChRoCoRaBaBg,
    /// channel:row:bank:bankgroup:rank:column
    ChRoBaBgRaCo,
    /// row:column:rank:bank:bankgroup:channel
    RoCoRaBaBgCh,
}

impl AddressMapping {
    /// Every supported scheme.
    pub const ALL: [AddressMapping; 7] = [
        AddressMapping::ChRaRoCoBaBg,
        AddressMapping::ChRoCoBaBgRa,
        AddressMapping::ChRaBaBgCoRo,
        AddressMapping::ChRaBaBgRoCo,
        AddressMapping::ChRoCoRaBaBg,
        AddressMapping::ChRoBaBgRaCo,
        AddressMapping::RoCoRaBaBgCh,
    ];

    /// Parses a scheme name.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownMapping`] carrying the caller's location if `name` is not
    /// one of the supported schemes.
    #[track_caller]
    pub fn parse(name: &str) -> Result<AddressMapping, UnknownMapping> {
        let location = Location::caller();
        AddressMapping::ALL
            .into_iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| UnknownMapping {
                name: name.to_string(),
                location,
            })
    }

    /// The configuration name of this scheme.
    pub fn name(&self) -> &'static str {
        match self {
            AddressMapping::ChRaRoCoBaBg => "chrarocobabg",
            AddressMapping::ChRoCoBaBgRa => "chrocobabgra",
            AddressMapping::ChRaBaBgCoRo => "chrababgcoro",
            AddressMapping::ChRaBaBgRoCo => "chrababgroco",
            AddressMapping::ChRoCoRaBaBg => "chrocorababg",
            AddressMapping::ChRoBaBgRaCo => "chrobabgraco",
            AddressMapping::RoCoRaBaBgCh => "rocorababgch",
        }
    }

    /// Fields of this scheme, most significant first.
    ///
    /// Derived from the two-character tokens of the scheme name.
    pub fn fields(&self) -> [Field; 6] {
        let mut out = [Field::Channel; 6];
        let tokens = self.name().chars().chunks(2);
        for (slot, token) in out.iter_mut().zip(&tokens) {
            let token: String = token.collect();
            // scheme names are fixed, every token is known
            if let Some(field) = Field::from_token(&token) {
                *slot = field;
            }
        }
        out
    }
}

impl Display for AddressMapping {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.fields().iter().join(":"))
    }
}
