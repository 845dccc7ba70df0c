//! Scenario tests for OBJ/MTL loading
