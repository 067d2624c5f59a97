use crate::error::BixResult;
use std::io::{prelude::*, BufReader};

pub trait Serialize {
    fn serialize(&self, writer: &mut dyn Write) -> BixResult<()>;
}

pub trait Deserialize {
    fn deserialize(reader: &mut impl BufRead) -> BixResult<Self>
    where
        Self: Sized;

    fn deserialize_unbuffered(reader: impl Read) -> BixResult<Self>
    where
        Self: Sized,
    {
        Self::deserialize(&mut BufReader::new(reader))
    }
}
