pub mod tests_discovery;
