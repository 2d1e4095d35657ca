//! Utility macros for use in the rest of the crate.

/// Make creating a HashMap a little less verbose
#[macro_export]
macro_rules! map {
    {} => { ::std::collections::HashMap::new() };

    { $($key:expr => $value:expr),+$(,)? } => {
        {
            let mut _map = ::std::collections::HashMap::new();
            $(_map.insert($key, $value);)+
            _map
        }
    };
}

// Remove and return the first element of a pop_front / push_back collection
// field matching the given predicate, preserving the order of the rest.
macro_rules! pop_where {
    ($self:ident, $field:ident, $pred:expr) => {{
        let mut remaining = ::std::mem::take(&mut $self.$field);
        let pred = $pred;
        let mut popped = None;

        while let Some(elem) = remaining.pop_front() {
            if popped.is_none() && (pred)(&elem) {
                popped = Some(elem);
            } else {
                $self.$field.push_back(elem);
            }
        }

        popped
    }};
}
