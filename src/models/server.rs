use std::{fmt, str::FromStr};

use strum::EnumIter;

/// FFXIAH market servers. Server names compare case-insensitively, but the
/// canonical spelling from `as_str` is what ends up in cache section keys.
#[derive(Debug, EnumIter, PartialEq, Eq, Clone, Copy)]
pub enum Server {
    Bahamut,
    Shiva,
    Phoenix,
    Carbuncle,
    Fenrir,
    Sylph,
    Valefor,
    Leviathan,
    Odin,
    Quetzalcoatl,
    Siren,
    Ragnarok,
    Cerberus,
    Bismarck,
    Lakshmi,
    Asura,
}

impl Server {
    pub fn as_str(&self) -> &'static str {
        match self {
            Server::Bahamut => "Bahamut",
            Server::Shiva => "Shiva",
            Server::Phoenix => "Phoenix",
            Server::Carbuncle => "Carbuncle",
            Server::Fenrir => "Fenrir",
            Server::Sylph => "Sylph",
            Server::Valefor => "Valefor",
            Server::Leviathan => "Leviathan",
            Server::Odin => "Odin",
            Server::Quetzalcoatl => "Quetzalcoatl",
            Server::Siren => "Siren",
            Server::Ragnarok => "Ragnarok",
            Server::Cerberus => "Cerberus",
            Server::Bismarck => "Bismarck",
            Server::Lakshmi => "Lakshmi",
            Server::Asura => "Asura",
        }
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Server {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "bahamut" => Ok(Self::Bahamut),
            "shiva" => Ok(Self::Shiva),
            "phoenix" => Ok(Self::Phoenix),
            "carbuncle" => Ok(Self::Carbuncle),
            "fenrir" => Ok(Self::Fenrir),
            "sylph" => Ok(Self::Sylph),
            "valefor" => Ok(Self::Valefor),
            "leviathan" => Ok(Self::Leviathan),
            "odin" => Ok(Self::Odin),
            "quetzalcoatl" => Ok(Self::Quetzalcoatl),
            "siren" => Ok(Self::Siren),
            "ragnarok" => Ok(Self::Ragnarok),
            "cerberus" => Ok(Self::Cerberus),
            "bismarck" => Ok(Self::Bismarck),
            "lakshmi" => Ok(Self::Lakshmi),
            "asura" => Ok(Self::Asura),
            _ => Err(format!("{} is not a known FFXI server.", s)),
        }
    }
}
