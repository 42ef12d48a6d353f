mod default;
mod test_suite;
