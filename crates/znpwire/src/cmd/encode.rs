use serde_json::{Map, Value as JsonValue};
use znpwire_schema::Direction;

use crate::cmd::{Context, EncodeArgs};
use crate::exit::{io_error, schema_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::print_encoded;

pub fn run(args: EncodeArgs, ctx: &Context) -> CliResult<i32> {
    let catalog = ctx.catalog()?;
    let def = catalog
        .by_name(&args.command)
        .ok_or_else(|| CliError::new(USAGE, format!("unknown command: {}", args.command)))?;
    let direction = if args.response {
        Direction::Response
    } else {
        Direction::Request
    };

    let object = param_object(&args)?;
    let schema = def
        .schema(direction)
        .map_err(|err| schema_error("encode failed", err))?;
    let params = schema
        .params_from_json(&object)
        .map_err(|err| schema_error("invalid parameters", err))?;

    let frame = catalog
        .encode(&def.qualified_name(), direction, &params)
        .map_err(|err| schema_error("encode failed", err))?;
    let wire = if args.general {
        frame.frame().serialize()
    } else {
        frame.serialize()
    };

    print_encoded(&def, direction, &wire, &frame, ctx.format);
    Ok(SUCCESS)
}

/// Collect parameters from `--json`, `--params-file` or `--param` flags.
fn param_object(args: &EncodeArgs) -> CliResult<Map<String, JsonValue>> {
    let text = match (&args.json, &args.params_file) {
        (Some(json), _) => Some(json.clone()),
        (None, Some(path)) => Some(
            std::fs::read_to_string(path)
                .map_err(|err| io_error(&format!("reading {}", path.display()), err))?,
        ),
        (None, None) => None,
    };

    if let Some(text) = text {
        return match serde_json::from_str::<JsonValue>(&text) {
            Ok(JsonValue::Object(object)) => Ok(object),
            Ok(_) => Err(CliError::new(DATA_INVALID, "parameters must be a JSON object")),
            Err(err) => Err(CliError::new(DATA_INVALID, format!("invalid parameter JSON: {err}"))),
        };
    }

    let mut object = Map::new();
    for pair in &args.param {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| CliError::new(USAGE, format!("expected NAME=VALUE, got {pair}")))?;
        let value = serde_json::from_str(value).unwrap_or_else(|_| JsonValue::String(value.to_string()));
        object.insert(name.trim().to_string(), value);
    }
    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(params: &[&str]) -> EncodeArgs {
        EncodeArgs {
            command: "AF.DataRequest".to_string(),
            response: false,
            json: None,
            params_file: None,
            param: params.iter().map(|p| p.to_string()).collect(),
            general: false,
        }
    }

    #[test]
    fn param_flags_parse_json_or_fall_back_to_strings() {
        let object = param_object(&args(&["TSN=5", "Data=cafe", "Dst={\"mode\":\"nwk\",\"address\":1}"])).unwrap();
        assert_eq!(object.get("TSN"), Some(&JsonValue::from(5)));
        assert_eq!(object.get("Data"), Some(&JsonValue::from("cafe")));
        assert!(object.get("Dst").is_some_and(JsonValue::is_object));
    }

    #[test]
    fn param_flag_without_equals_is_usage_error() {
        assert_eq!(param_object(&args(&["TSN"])).unwrap_err().code, USAGE);
    }

    #[test]
    fn json_must_be_an_object() {
        let mut a = args(&[]);
        a.json = Some("[1, 2]".to_string());
        assert_eq!(param_object(&a).unwrap_err().code, DATA_INVALID);
    }
}
