//! State of a query read by a view

/// Represents the state of an async read
#[derive(Clone, PartialEq, Debug)]
pub enum QueryState<T, E> {
    /// No data yet, a fetch is running
    Loading,
    /// The last fetch succeeded
    Success(T),
    /// The last fetch failed
    Error(E),
}

impl<T, E> QueryState<T, E> {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, QueryState::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryState::Error(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            QueryState::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Maps the data of a successful read
    pub fn map<U, F>(self, op: F) -> QueryState<U, E>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            QueryState::Success(data) => QueryState::Success(op(data)),
            QueryState::Error(e) => QueryState::Error(e),
            QueryState::Loading => QueryState::Loading,
        }
    }

    pub fn map_err<F, O>(self, op: O) -> QueryState<T, F>
    where
        O: FnOnce(E) -> F,
    {
        match self {
            QueryState::Success(data) => QueryState::Success(data),
            QueryState::Error(e) => QueryState::Error(op(e)),
            QueryState::Loading => QueryState::Loading,
        }
    }
}

impl<T, E> From<Result<T, E>> for QueryState<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => QueryState::Success(data),
            Err(error) => QueryState::Error(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_result_and_map() {
        let state: QueryState<u32, String> = Ok(2).into();
        assert_eq!(state.clone().map(|n| n * 10).data(), Some(&20));

        let failed: QueryState<u32, String> = Err("unauthorized".to_string()).into();
        assert!(failed.is_error());
        assert_eq!(failed.map_err(|e| e.len()).error(), Some(&12));
        assert!(QueryState::<u32, String>::Loading.is_loading());
    }
}
