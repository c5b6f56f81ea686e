//! # Command Line
//!
//! Turns `argv` into a [`Command`]. Only shape and syntax are checked here
//! (missing flags, non-numeric numbers, malformed dates); business rules
//! stay in the services.
//!
//! ```text
//! ["order", "finish", "a1", "b2"]
//!        │
//!        ▼
//!   ArgList { positionals: ["a1", "b2"], flags: {} }
//!        │
//!        ▼
//!   Command::OrderFinish { ids: ["a1", "b2"] }
//! ```

use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

use stockroom_core::validation::parse_date;
use stockroom_core::{NewProduct, OrderRequest, OrderStatus, PriceType};

pub const USAGE: &str = "\
Stockroom - inventory, orders and daily reports

Usage: stockroom <group> <command> [args]

Categories:
  category add <name>
  category list

Products:
  product add --name <n> --category <id> --arrival <p> --sales <p> --kaspi <p> [--quantity <q>]
  product list [--category <id>]
  product show <id>
  product restock <id> <quantity>
  product price <id> --arrival <p> --sales <p> --kaspi <p>

Orders:
  order create --product <id> --quantity <q> --deadline <YYYY-MM-DD> [--price-type sales|kaspi]
  order finish <id>...
  order list [--status new|finished]
  order show <id>
  order count

Reports:
  report rebuild <YYYY-MM-DD> [<YYYY-MM-DD>]
  report show <YYYY-MM-DD>
  report list [--from <date>] [--to <date>]

Expenses:
  expense list <YYYY-MM-DD>
  expense list --product <id>

Environment:
  STOCKROOM_DB_PATH, STOCKROOM_UTC_OFFSET, STOCKROOM_STORE_NAME,
  STOCKROOM_CURRENCY_SYMBOL, STOCKROOM_MAX_CONNECTIONS, RUST_LOG";

// =============================================================================
// Errors
// =============================================================================

/// Malformed command line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("missing argument <{0}>")]
    MissingArgument(&'static str),

    #[error("missing option --{0}")]
    MissingFlag(&'static str),

    #[error("option --{0} needs a value")]
    FlagWithoutValue(String),

    #[error("unexpected argument: {0}")]
    Unexpected(String),

    #[error("invalid value for {name}: '{value}' ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

// =============================================================================
// Command
// =============================================================================

/// One parsed invocation.
#[derive(Debug, Clone)]
pub enum Command {
    Help,

    CategoryAdd { name: String },
    CategoryList,

    ProductAdd(NewProduct),
    ProductList { category_id: Option<String> },
    ProductShow { id: String },
    ProductRestock { id: String, quantity: i64 },
    ProductPrice {
        id: String,
        arrival_price: i64,
        sales_price: i64,
        kaspi_price: i64,
    },

    OrderCreate(OrderRequest),
    OrderFinish { ids: Vec<String> },
    OrderList { status: Option<OrderStatus> },
    OrderShow { id: String },
    OrderCount,

    ReportRebuild { from: NaiveDate, to: Option<NaiveDate> },
    ReportShow { date: NaiveDate },
    ReportList { from: Option<NaiveDate>, to: Option<NaiveDate> },

    ExpenseList { date: NaiveDate },
    ExpenseListProduct { product_id: String },
}

impl Command {
    /// Parses arguments without the program name.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Command, CliError> {
        let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();

        let (group, action, rest) = match args.as_slice() {
            [] => return Ok(Command::Help),
            [flag, ..] if matches!(*flag, "-h" | "--help" | "help") => return Ok(Command::Help),
            [group] => (*group, "", &[][..]),
            [group, action, rest @ ..] => (*group, *action, rest),
        };

        let mut list = ArgList::split(rest)?;

        let command = match (group, action) {
            ("category", "add") => Command::CategoryAdd {
                name: list.positional("name")?,
            },
            ("category", "list") => Command::CategoryList,

            ("product", "add") => Command::ProductAdd(NewProduct {
                name: list.flag("name")?,
                category_id: list.flag("category")?,
                arrival_price: number("--arrival", &list.flag("arrival")?)?,
                sales_price: number("--sales", &list.flag("sales")?)?,
                kaspi_price: number("--kaspi", &list.flag("kaspi")?)?,
                quantity: match list.optional_flag("quantity") {
                    Some(q) => number("--quantity", &q)?,
                    None => 0,
                },
            }),
            ("product", "list") => Command::ProductList {
                category_id: list.optional_flag("category"),
            },
            ("product", "show") => Command::ProductShow {
                id: list.positional("id")?,
            },
            ("product", "restock") => Command::ProductRestock {
                id: list.positional("id")?,
                quantity: number("quantity", &list.positional("quantity")?)?,
            },
            ("product", "price") => Command::ProductPrice {
                id: list.positional("id")?,
                arrival_price: number("--arrival", &list.flag("arrival")?)?,
                sales_price: number("--sales", &list.flag("sales")?)?,
                kaspi_price: number("--kaspi", &list.flag("kaspi")?)?,
            },

            ("order", "create") => Command::OrderCreate(OrderRequest {
                product_id: list.flag("product")?,
                quantity: number("--quantity", &list.flag("quantity")?)?,
                deadline: date("--deadline", &list.flag("deadline")?)?,
                price_type: match list.optional_flag("price-type") {
                    Some(value) => value.parse::<PriceType>().map_err(|e| CliError::InvalidValue {
                        name: "--price-type",
                        value,
                        reason: e.to_string(),
                    })?,
                    None => PriceType::default(),
                },
            }),
            ("order", "finish") => {
                let ids = list.take_positionals();
                if ids.is_empty() {
                    return Err(CliError::MissingArgument("id"));
                }
                Command::OrderFinish { ids }
            }
            ("order", "list") => Command::OrderList {
                status: match list.optional_flag("status") {
                    Some(value) => Some(value.parse::<OrderStatus>().map_err(|e| {
                        CliError::InvalidValue {
                            name: "--status",
                            value,
                            reason: e.to_string(),
                        }
                    })?),
                    None => None,
                },
            },
            ("order", "show") => Command::OrderShow {
                id: list.positional("id")?,
            },
            ("order", "count") => Command::OrderCount,

            ("report", "rebuild") => Command::ReportRebuild {
                from: date("date", &list.positional("date")?)?,
                to: match list.optional_positional() {
                    Some(to) => Some(date("to", &to)?),
                    None => None,
                },
            },
            ("report", "show") => Command::ReportShow {
                date: date("date", &list.positional("date")?)?,
            },
            ("report", "list") => Command::ReportList {
                from: list.optional_flag("from").map(|d| date("--from", &d)).transpose()?,
                to: list.optional_flag("to").map(|d| date("--to", &d)).transpose()?,
            },

            ("expense", "list") => match list.optional_flag("product") {
                Some(product_id) => Command::ExpenseListProduct { product_id },
                None => Command::ExpenseList {
                    date: date("date", &list.positional("date")?)?,
                },
            },

            _ => return Err(CliError::UnknownCommand(format!("{} {}", group, action).trim().to_string())),
        };

        list.finish()?;
        Ok(command)
    }
}

// =============================================================================
// Argument list
// =============================================================================

/// Positionals in order plus `--flag value` pairs. Every flag takes a value.
#[derive(Debug, Default)]
struct ArgList {
    positionals: Vec<String>,
    flags: BTreeMap<String, String>,
}

impl ArgList {
    fn split(args: &[&str]) -> Result<Self, CliError> {
        let mut list = ArgList::default();

        let mut i = 0;
        while i < args.len() {
            match args[i].strip_prefix("--") {
                Some(name) => {
                    let (name, value) = match name.split_once('=') {
                        Some((n, v)) => (n, v.to_string()),
                        None => {
                            let value = args
                                .get(i + 1)
                                .ok_or_else(|| CliError::FlagWithoutValue(name.to_string()))?;
                            i += 1;
                            (name, value.to_string())
                        }
                    };
                    list.flags.insert(name.to_string(), value);
                }
                None => list.positionals.push(args[i].to_string()),
            }
            i += 1;
        }

        list.positionals.reverse();
        Ok(list)
    }

    fn positional(&mut self, name: &'static str) -> Result<String, CliError> {
        self.positionals.pop().ok_or(CliError::MissingArgument(name))
    }

    fn optional_positional(&mut self) -> Option<String> {
        self.positionals.pop()
    }

    fn take_positionals(&mut self) -> Vec<String> {
        let mut all = std::mem::take(&mut self.positionals);
        all.reverse();
        all
    }

    fn flag(&mut self, name: &'static str) -> Result<String, CliError> {
        self.flags.remove(name).ok_or(CliError::MissingFlag(name))
    }

    fn optional_flag(&mut self, name: &str) -> Option<String> {
        self.flags.remove(name)
    }

    /// Anything left over was not understood.
    fn finish(self) -> Result<(), CliError> {
        if let Some(extra) = self.positionals.last() {
            return Err(CliError::Unexpected(extra.clone()));
        }
        if let Some(flag) = self.flags.keys().next() {
            return Err(CliError::Unexpected(format!("--{}", flag)));
        }
        Ok(())
    }
}

fn number(name: &'static str, value: &str) -> Result<i64, CliError> {
    value.trim().parse::<i64>().map_err(|e| CliError::InvalidValue {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn date(name: &'static str, value: &str) -> Result<NaiveDate, CliError> {
    parse_date(name, value).map_err(|e| CliError::InvalidValue {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command, CliError> {
        let args: Vec<&str> = line.split_whitespace().collect();
        Command::parse(&args)
    }

    #[test]
    fn test_help() {
        assert!(matches!(parse(""), Ok(Command::Help)));
        assert!(matches!(parse("--help"), Ok(Command::Help)));
    }

    #[test]
    fn test_product_add() {
        let cmd = parse("product add --name Beans --category c1 --arrival 100 --sales 150 --kaspi 170 --quantity 10")
            .unwrap();
        match cmd {
            Command::ProductAdd(p) => {
                assert_eq!(p.name, "Beans");
                assert_eq!(p.category_id, "c1");
                assert_eq!((p.arrival_price, p.sales_price, p.kaspi_price), (100, 150, 170));
                assert_eq!(p.quantity, 10);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_product_add_quantity_defaults_to_zero() {
        let cmd = parse("product add --name B --category c --arrival 1 --sales 2 --kaspi 3").unwrap();
        assert!(matches!(cmd, Command::ProductAdd(p) if p.quantity == 0));
    }

    #[test]
    fn test_order_create() {
        let cmd = parse("order create --product p1 --quantity 4 --deadline 2025-03-05 --price-type=kaspi")
            .unwrap();
        match cmd {
            Command::OrderCreate(r) => {
                assert_eq!(r.product_id, "p1");
                assert_eq!(r.quantity, 4);
                assert_eq!(r.deadline, NaiveDate::from_ymd_opt(2025, 3, 5).unwrap());
                assert_eq!(r.price_type, PriceType::Kaspi);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_order_create_defaults_to_sales_price() {
        let cmd = parse("order create --product p1 --quantity 1 --deadline 2025-03-05").unwrap();
        assert!(matches!(cmd, Command::OrderCreate(r) if r.price_type == PriceType::Sales));
    }

    #[test]
    fn test_order_finish_keeps_id_order() {
        match parse("order finish a b c").unwrap() {
            Command::OrderFinish { ids } => assert_eq!(ids, vec!["a", "b", "c"]),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(parse("order finish").unwrap_err(), CliError::MissingArgument("id"));
    }

    #[test]
    fn test_report_rebuild_range() {
        match parse("report rebuild 2025-03-01 2025-03-07").unwrap() {
            Command::ReportRebuild { from, to } => {
                assert_eq!(from, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
                assert_eq!(to, NaiveDate::from_ymd_opt(2025, 3, 7));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            parse("report rebuild 2025-03-01").unwrap(),
            Command::ReportRebuild { to: None, .. }
        ));
    }

    #[test]
    fn test_expense_list_by_date_or_product() {
        assert!(matches!(
            parse("expense list 2025-03-02").unwrap(),
            Command::ExpenseList { date } if date == NaiveDate::from_ymd_opt(2025, 3, 2).unwrap()
        ));
        match parse("expense list --product p1").unwrap() {
            Command::ExpenseListProduct { product_id } => assert_eq!(product_id, "p1"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            parse("expense list --product p1 2025-03-02").unwrap_err(),
            CliError::Unexpected("2025-03-02".to_string())
        );
        assert_eq!(parse("expense list").unwrap_err(), CliError::MissingArgument("date"));
        assert!(matches!(parse("order count").unwrap(), Command::OrderCount));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse("order explode"), Err(CliError::UnknownCommand(_))));
        assert_eq!(
            parse("product price p1 --arrival 1 --sales 2").unwrap_err(),
            CliError::MissingFlag("kaspi")
        );
        assert!(matches!(
            parse("product restock p1 many"),
            Err(CliError::InvalidValue { name: "quantity", .. })
        ));
        assert!(matches!(
            parse("report show 2025-13-01"),
            Err(CliError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse("order list --status done"),
            Err(CliError::InvalidValue { name: "--status", .. })
        ));
        assert_eq!(
            parse("category list extra").unwrap_err(),
            CliError::Unexpected("extra".to_string())
        );
        assert_eq!(
            parse("order show o1 --verbose yes").unwrap_err(),
            CliError::Unexpected("--verbose".to_string())
        );
        assert_eq!(
            parse("order list --status").unwrap_err(),
            CliError::FlagWithoutValue("status".to_string())
        );
    }
}
