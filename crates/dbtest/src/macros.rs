//! Declarative macros for building test data.

/// Creates a [`Criteria`](common::Criteria) from `column => value` pairs.
///
/// Values go through `Into<Value>`, so integers, strings, booleans and
/// `Option`s can be used directly. A repeated column keeps the last value.
///
/// # Syntax
///
/// ```text
/// criteria! {}
/// criteria! { "col" => value, "col2" => value2, ... }
/// ```
///
/// # Examples
///
/// ```
/// use dbtest::criteria;
/// use types::Value;
///
/// let c = criteria! { "id" => 1, "name" => "Ann", "email" => None::<String> };
/// assert_eq!(c.len(), 3);
/// assert_eq!(c.get("email"), Some(&Value::Null));
/// ```
///
/// ```
/// use dbtest::criteria;
///
/// // Matches every row.
/// let any = criteria! {};
/// assert!(any.is_empty());
/// ```
#[macro_export]
macro_rules! criteria {
    () => {
        $crate::Criteria::new()
    };

    ($($column:expr => $value:expr),+ $(,)?) => {
        $crate::Criteria::new()$(.with($column, $value))+
    };
}

#[cfg(test)]
mod tests {
    use types::Value;

    #[test]
    fn criteria_macro_builds_filters() {
        let c = criteria! { "id" => 5, "status" => "pending", "paid" => false, };
        assert_eq!(c.get("id"), Some(&Value::Int(5)));
        assert_eq!(c.get("status"), Some(&Value::Text("pending".into())));
        assert_eq!(c.get("paid"), Some(&Value::Bool(false)));
    }

    #[test]
    fn repeated_column_keeps_last_value() {
        let c = criteria! { "id" => 1, "id" => 2 };
        assert_eq!(c.len(), 1);
        assert_eq!(c.get("id"), Some(&Value::Int(2)));
    }
}
