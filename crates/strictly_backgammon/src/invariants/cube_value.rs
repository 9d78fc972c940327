//! Cube value: the doubling cube always shows a power of two.

use super::Invariant;
use crate::cube::{Cube, CubeOwner};

/// Invariant: cube value is a power of two, and a turned cube has an owner.
pub struct CubeValueInvariant;

impl Invariant<Cube> for CubeValueInvariant {
    fn holds(cube: &Cube) -> bool {
        let value = cube.value();
        value.is_power_of_two() && (value == 1) == (cube.owner() == CubeOwner::Centered)
    }

    fn description() -> &'static str {
        "Cube value is a power of two and is centered exactly when it shows 1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::OfferContext;
    use crate::types::Player;

    #[test]
    fn test_fresh_cube_holds() {
        assert!(CubeValueInvariant::holds(&Cube::new()));
    }

    #[test]
    fn test_accepted_cube_holds() {
        let mut cube = Cube::new();
        cube.offer(Player::White, &OfferContext::default()).unwrap();
        cube.respond(true).unwrap();
        assert!(CubeValueInvariant::holds(&cube));
    }
}
