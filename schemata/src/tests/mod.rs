//! Behavioural tests for derived artifacts.
//!
//! Unit tests live next to the code they cover; the modules here exercise
//! whole schemas through the public interpreter.


#[cfg(test)]
pub mod union_tests;


#[cfg(test)]
pub mod provider_tests;



#[cfg(test)]
pub mod arbitrary_tests;

#[cfg(test)]
pub mod optics_tests;
