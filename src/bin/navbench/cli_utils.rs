use bevy::prelude::*;
use navgrid::errors::{NavError, NavResult};

/// Generic parser for delimited strings that return tuples
pub fn parse_delimited<T, const N: usize>(
    input: &str,
    delimiter: char,
    type_name: &str,
    parser: impl Fn(&str) -> Result<T, std::num::ParseFloatError>,
) -> NavResult<[T; N]>
where
    T: Copy + Default,
{
    let parts: Vec<&str> = input.split(delimiter).collect();
    if parts.len() != N {
        return Err(NavError::InvalidArgument {
            reason: format!(
                "Invalid {type_name} format '{input}'. Expected {N} {delimiter}-separated values"
            ),
        });
    }

    let mut result = [T::default(); N];
    for (i, part) in parts.iter().enumerate() {
        result[i] = parser(part.trim()).map_err(|_| NavError::InvalidArgument {
            reason: format!("Invalid {type_name} value: '{part}'"),
        })?;
    }

    Ok(result)
}

/// Parse heightmap size "WIDTHxHEIGHT" in samples
pub fn parse_size(size_str: &str) -> NavResult<(u32, u32)> {
    let [width, height] = parse_delimited::<f32, 2>(size_str, 'x', "size", |s| s.parse())?;
    if width.fract() != 0.0 || height.fract() != 0.0 {
        return Err(NavError::InvalidArgument {
            reason: format!("Size '{size_str}' must be whole numbers of samples"),
        });
    }
    let (width, height) = (width as u32, height as u32);

    if width < 2 || height < 2 {
        return Err(NavError::InvalidArgument {
            reason: "Width and height must be at least 2 samples".to_string(),
        });
    }

    if width > 4096 || height > 4096 {
        return Err(NavError::InvalidArgument {
            reason: "Width and height must not exceed 4096".to_string(),
        });
    }

    Ok((width, height))
}

/// Parse position string "X,Y,Z"
pub fn parse_position(pos_str: &str) -> NavResult<Vec3> {
    let [x, y, z] = parse_delimited::<f32, 3>(pos_str, ',', "position", |s| s.parse())?;
    Ok(Vec3::new(x, y, z))
}
