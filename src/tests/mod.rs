
mod shortnumberinfo_tests;
