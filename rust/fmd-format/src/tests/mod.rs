pub mod fixtures;



#[cfg(test)]
mod decode_scenarios;

#[cfg(test)]
mod verification;
