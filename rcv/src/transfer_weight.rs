// Copyright the ConcreteRCV developers.
// This file is part of ConcreteRCV.
// ConcreteRCV is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// ConcreteRCV is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with ConcreteRCV.  If not, see <https://www.gnu.org/licenses/>.


//! Exact vote arithmetic. Ballot weights and surplus fractions are arbitrary
//! precision rationals for the whole count; decimal rounding happens exactly
//! once, when a tally is written into the round record.

use num::{BigInt, BigRational, Integer, One, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// The fraction of its former value a ballot keeps when a winner's surplus is
/// passed on. Exact rational, never rounded.
#[derive(Clone,Debug,Eq,PartialEq,Ord,PartialOrd,Hash)]
pub struct TransferWeight(pub BigRational);

impl TransferWeight {
    pub fn one() -> Self { TransferWeight(BigRational::one()) }

    /// The fraction (tally-threshold)/tally used to scale an elected
    /// candidate's ballots. Zero surplus gives a zero weight.
    pub fn surplus_fraction(tally:&BigRational,threshold:&BigRational) -> Self {
        TransferWeight((tally-threshold)/tally)
    }

    pub fn times(&self,votes:&BigRational) -> BigRational { &self.0*votes }
}

impl fmt::Display for TransferWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_integer() { write!(f,"{}",self.0.numer()) }
        else { write!(f,"{}/{}",self.0.numer(),self.0.denom()) }
    }
}

impl Serialize for TransferWeight {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where S: Serializer {
        serializer.serialize_str(&self.to_string())
    }
}

impl <'de> Deserialize<'de> for TransferWeight {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where D: Deserializer<'de> {
        let buf = String::deserialize(deserializer)?;
        parse_rational(&buf).map(TransferWeight).ok_or_else(||serde::de::Error::custom(format!("{} is not a rational",buf)))
    }
}

/// Round an exact value to the given number of decimal places. Half-way values
/// go to even when `half_to_even`, otherwise away from zero.
pub fn round_to_places(value:&BigRational,places:u32,half_to_even:bool) -> BigRational {
    let scale = num::pow(BigInt::from(10u8),places as usize);
    let scaled = value*BigRational::from_integer(scale.clone());
    let (quotient,remainder) = scaled.numer().div_rem(scaled.denom());
    let round_up = match (&remainder*BigInt::from(2u8)).cmp(scaled.denom()) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => if half_to_even { quotient.is_odd() } else { true },
    };
    let quotient = if round_up { quotient+BigInt::one() } else { quotient };
    BigRational::new(quotient,scale)
}

/// A reportable tally value. Exact, but only ever constructed from values
/// already rounded to the configured decimal places, so it prints as a plain
/// decimal.
#[derive(Clone,Debug,Eq,PartialEq,Ord,PartialOrd,Hash)]
pub struct VoteTally(pub BigRational);

impl VoteTally {
    pub fn zero() -> Self { VoteTally(BigRational::zero()) }
    pub fn from_integer(votes:u64) -> Self { VoteTally(BigRational::from_integer(BigInt::from(votes))) }
    /// Round an exact engine value into a reportable tally.
    pub fn rounded(value:&BigRational,places:u32,half_to_even:bool) -> Self {
        VoteTally(round_to_places(value,places,half_to_even))
    }
}

impl fmt::Display for VoteTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let denom = self.0.denom();
        if denom.is_one() { return write!(f,"{}",self.0.numer()); }
        // a denominator of the form 2^a·5^b prints as an exact decimal expansion
        let two = BigInt::from(2u8);
        let five = BigInt::from(5u8);
        let mut rest = denom.clone();
        let mut twos : usize = 0;
        let mut fives : usize = 0;
        while (&rest%&two).is_zero() { rest /= &two; twos+=1; }
        while (&rest%&five).is_zero() { rest /= &five; fives+=1; }
        if rest.is_one() {
            let digits = twos.max(fives);
            let scale = num::pow(BigInt::from(10u8),digits);
            let (int_part,frac_part) = (self.0.numer()*&scale/denom).div_rem(&scale);
            let decimal_digits = format!("{:01$}",frac_part,digits);
            write!(f,"{}.{}",int_part,decimal_digits.trim_end_matches('0'))
        } else {
            write!(f,"{}/{}",self.0.numer(),denom)
        }
    }
}

impl FromStr for VoteTally {
    type Err = String;
    fn from_str(buf: &str) -> Result<Self, Self::Err> {
        parse_rational(buf).map(VoteTally).ok_or_else(||format!("{} is not a tally",buf))
    }
}

impl Serialize for VoteTally {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where S: Serializer {
        serializer.serialize_str(&self.to_string())
    }
}

impl <'de> Deserialize<'de> for VoteTally {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where D: Deserializer<'de> {
        let buf = String::deserialize(deserializer)?;
        buf.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse "n/d", "int.frac" or "int".
fn parse_rational(buf:&str) -> Option<BigRational> {
    if let Some((numer,denom)) = buf.split_once('/') {
        let numer : BigInt = numer.parse().ok()?;
        let denom : BigInt = denom.parse().ok()?;
        if denom.is_zero() { return None; }
        Some(BigRational::new(numer,denom))
    } else if let Some((int_part,frac_part)) = buf.split_once('.') {
        let int_part : BigInt = int_part.parse().ok()?;
        let frac_digits = frac_part.len();
        let frac_part : BigInt = frac_part.parse().ok()?;
        let scale = num::pow(BigInt::from(10u8),frac_digits);
        Some(BigRational::new(int_part*&scale+frac_part,scale))
    } else {
        let int_part : BigInt = buf.parse().ok()?;
        Some(BigRational::from_integer(int_part))
    }
}

#[cfg(test)]
mod tests {
    use crate::transfer_weight::{round_to_places, TransferWeight, VoteTally};
    use num::{BigInt, BigRational};

    fn rational(numer:i64,denom:i64) -> BigRational { BigRational::new(BigInt::from(numer),BigInt::from(denom)) }

    #[test]
    fn surplus_fraction_is_exact() {
        let fraction = TransferWeight::surplus_fraction(&rational(6,1),&rational(4,1));
        assert_eq!(rational(1,3),fraction.0);
        assert_eq!("1/3",fraction.to_string());
        assert_eq!(rational(2,1),fraction.times(&rational(6,1)));
    }

    #[test]
    fn rounding_half_up_and_half_to_even() {
        // 1/8 = 0.125
        assert_eq!(rational(13,100),round_to_places(&rational(1,8),2,false));
        assert_eq!(rational(12,100),round_to_places(&rational(1,8),2,true));
        // 3/8 = 0.375 rounds to even 0.38 either way at the half point with an even neighbour above
        assert_eq!(rational(38,100),round_to_places(&rational(3,8),2,false));
        assert_eq!(rational(38,100),round_to_places(&rational(3,8),2,true));
        // 1/3 is not at a half point
        assert_eq!(rational(3333,10000),round_to_places(&rational(1,3),4,true));
        // zero places
        assert_eq!(rational(1,1),round_to_places(&rational(1,2),0,false));
        assert_eq!(rational(0,1),round_to_places(&rational(1,2),0,true));
    }

    #[test]
    fn tally_prints_as_decimal() {
        assert_eq!("42",VoteTally(rational(42,1)).to_string());
        assert_eq!("45.25",VoteTally(rational(181,4)).to_string());
        assert_eq!("0.1",VoteTally(rational(1,10)).to_string());
        // non 10-smooth denominators fall back to the exact fraction
        assert_eq!("1/3",VoteTally(rational(1,3)).to_string());
        let parsed : VoteTally = "45.25".parse().unwrap();
        assert_eq!(VoteTally(rational(181,4)),parsed);
        let parsed : VoteTally = "2/6".parse().unwrap();
        assert_eq!(VoteTally(rational(1,3)),parsed);
    }
}
