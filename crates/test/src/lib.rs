//! Integration tests for the blob submission pipeline live in `tests/`.
