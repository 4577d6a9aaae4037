pub mod tests_documents;
pub mod tests_lexer;
