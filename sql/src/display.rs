//! SQL rendering for expressions and the SELECT family. Output re-parses to
//! an equal tree, which the round-trip tests rely on; it is also what names
//! computed result columns.

use std::fmt;

use crate::ast::{
    Expression, FrameBound, FrameUnits, JoinCondition, JoinType, Literal, LockMode, LockWait,
    MatchMode, OrderByItem, Quantifier, Select, SelectItem, SetOperator, TableReference,
    UnaryOperator, VariableScope, WindowSpec,
};

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "NULL"),
            Literal::Boolean(true) => write!(f, "TRUE"),
            Literal::Boolean(false) => write!(f, "FALSE"),
            Literal::Integer(v) => write!(f, "{}", v),
            // {:?} keeps a decimal point so the text re-lexes as a float
            Literal::Float(v) => write!(f, "{:?}", v),
            Literal::String(v) => {
                write!(f, "'{}'", v.replace('\\', "\\\\").replace('\'', "''"))
            }
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal { value, .. } => write!(f, "{}", value),
            Expression::ColumnRef { table, column, .. } => match table {
                Some(table) => write!(f, "{}.{}", table, column),
                None => write!(f, "{}", column),
            },
            Expression::Wildcard { table, .. } => match table {
                Some(table) => write!(f, "{}.*", table),
                None => write!(f, "*"),
            },
            Expression::BinaryOp { op, left, right, .. } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expression::UnaryOp { op, operand, .. } => match op {
                UnaryOperator::Minus => write!(f, "(- {})", operand),
                UnaryOperator::Not => write!(f, "(NOT {})", operand),
                UnaryOperator::Binary => write!(f, "(BINARY {})", operand),
            },
            Expression::FunctionCall {
                name,
                distinct,
                args,
                wildcard,
                order_by,
                separator,
                ..
            } => {
                write!(f, "{}(", name)?;
                if *distinct {
                    write!(f, "DISTINCT ")?;
                }
                if *wildcard {
                    write!(f, "*")?;
                } else {
                    write_list(f, args)?;
                    if !order_by.is_empty() {
                        write!(f, " ORDER BY ")?;
                        write_list(f, order_by)?;
                    }
                    if let Some(separator) = separator {
                        write!(f, " SEPARATOR '{}'", separator.replace('\'', "''"))?;
                    }
                }
                write!(f, ")")
            }
            Expression::WindowFunction { function, window, .. } => {
                write!(f, "{} OVER {}", function, window)
            }
            Expression::Case {
                operand,
                branches,
                else_branch,
                ..
            } => {
                write!(f, "CASE")?;
                if let Some(operand) = operand {
                    write!(f, " {}", operand)?;
                }
                for (condition, result) in branches {
                    write!(f, " WHEN {} THEN {}", condition, result)?;
                }
                if let Some(else_branch) = else_branch {
                    write!(f, " ELSE {}", else_branch)?;
                }
                write!(f, " END")
            }
            Expression::InList {
                expr,
                list,
                negated,
                ..
            } => {
                write!(f, "{}{} IN (", expr, if *negated { " NOT" } else { "" })?;
                write_list(f, list)?;
                write!(f, ")")
            }
            Expression::InSubquery {
                expr,
                subquery,
                negated,
                ..
            } => write!(
                f,
                "{}{} IN ({})",
                expr,
                if *negated { " NOT" } else { "" },
                subquery
            ),
            Expression::Between {
                expr,
                low,
                high,
                negated,
                ..
            } => write!(
                f,
                "{}{} BETWEEN {} AND {}",
                expr,
                if *negated { " NOT" } else { "" },
                low,
                high
            ),
            Expression::Like {
                expr,
                pattern,
                negated,
                ..
            } => write!(
                f,
                "{}{} LIKE {}",
                expr,
                if *negated { " NOT" } else { "" },
                pattern
            ),
            Expression::IsNull { expr, negated, .. } => {
                write!(f, "{} IS{} NULL", expr, if *negated { " NOT" } else { "" })
            }
            Expression::Exists {
                subquery, negated, ..
            } => {
                if *negated {
                    write!(f, "NOT ")?;
                }
                write!(f, "EXISTS ({})", subquery)
            }
            Expression::Quantified {
                op,
                quantifier,
                expr,
                subquery,
                ..
            } => {
                let quantifier = match quantifier {
                    Quantifier::All => "ALL",
                    Quantifier::Any => "ANY",
                    Quantifier::Some => "SOME",
                };
                write!(f, "{} {} {} ({})", expr, op.symbol(), quantifier, subquery)
            }
            Expression::Subquery { query, .. } => write!(f, "({})", query),
            Expression::SystemVariable { name, scope, .. } => match scope {
                VariableScope::Global => write!(f, "@@global.{}", name),
                VariableScope::Session => write!(f, "@@session.{}", name),
            },
            Expression::MatchAgainst {
                columns,
                pattern,
                mode,
                ..
            } => {
                write!(f, "MATCH (")?;
                write_list(f, columns)?;
                write!(f, ") AGAINST ({}", pattern)?;
                match mode {
                    Some(MatchMode::Boolean) => write!(f, " IN BOOLEAN MODE")?,
                    Some(MatchMode::NaturalLanguage) => write!(f, " IN NATURAL LANGUAGE MODE")?,
                    Some(MatchMode::QueryExpansion) => write!(f, " WITH QUERY EXPANSION")?,
                    None => {}
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for OrderByItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.expr, if self.asc { "" } else { " DESC" })
    }
}

impl fmt::Display for WindowSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        let mut need_space = false;
        if let Some(name) = &self.name_ref {
            write!(f, "{}", name)?;
            need_space = true;
        }
        if !self.partition_by.is_empty() {
            if need_space {
                write!(f, " ")?;
            }
            write!(f, "PARTITION BY ")?;
            write_list(f, &self.partition_by)?;
            need_space = true;
        }
        if !self.order_by.is_empty() {
            if need_space {
                write!(f, " ")?;
            }
            write!(f, "ORDER BY ")?;
            write_list(f, &self.order_by)?;
            need_space = true;
        }
        if let Some(frame) = &self.frame {
            if need_space {
                write!(f, " ")?;
            }
            let units = match frame.units {
                FrameUnits::Rows => "ROWS",
                FrameUnits::Range => "RANGE",
            };
            write!(
                f,
                "{} BETWEEN {} AND {}",
                units,
                frame_bound(&frame.start),
                frame_bound(&frame.end)
            )?;
        }
        write!(f, ")")
    }
}

fn frame_bound(bound: &FrameBound) -> String {
    match bound {
        FrameBound::UnboundedPreceding => "UNBOUNDED PRECEDING".to_string(),
        FrameBound::UnboundedFollowing => "UNBOUNDED FOLLOWING".to_string(),
        FrameBound::CurrentRow => "CURRENT ROW".to_string(),
        FrameBound::Preceding(n) => format!("{} PRECEDING", n),
        FrameBound::Following(n) => format!("{} FOLLOWING", n),
    }
}

impl fmt::Display for SelectItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} AS {}", self.expr, alias),
            None => write!(f, "{}", self.expr),
        }
    }
}

impl fmt::Display for TableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableReference::Table { name, alias } => {
                write!(f, "{}", name)?;
                if let Some(alias) = alias {
                    write!(f, " AS {}", alias)?;
                }
                Ok(())
            }
            TableReference::Subquery { query, alias } => {
                write!(f, "({})", query)?;
                if let Some(alias) = alias {
                    write!(f, " AS {}", alias)?;
                }
                Ok(())
            }
            TableReference::Join {
                left,
                join_type,
                natural,
                right,
                condition,
            } => {
                write!(f, "{}", left)?;
                if *natural {
                    write!(f, " NATURAL")?;
                }
                let join = match join_type {
                    JoinType::Inner => " JOIN",
                    JoinType::Left => " LEFT JOIN",
                    JoinType::Right => " RIGHT JOIN",
                    JoinType::Full => " FULL JOIN",
                    JoinType::Cross => " CROSS JOIN",
                };
                write!(f, "{} {}", join, right)?;
                match condition {
                    JoinCondition::None => Ok(()),
                    JoinCondition::On(expr) => write!(f, " ON {}", expr),
                    JoinCondition::Using(columns) => {
                        write!(f, " USING ({})", columns.join(", "))
                    }
                }
            }
        }
    }
}

impl fmt::Display for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(with) = &self.with {
            write!(f, "WITH ")?;
            if with.recursive {
                write!(f, "RECURSIVE ")?;
            }
            for (i, cte) in with.ctes.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", cte.name)?;
                if !cte.columns.is_empty() {
                    write!(f, " ({})", cte.columns.join(", "))?;
                }
                write!(f, " AS ({})", cte.query)?;
            }
            write!(f, " ")?;
        }

        write!(f, "SELECT ")?;
        if self.distinct {
            write!(f, "DISTINCT ")?;
        }
        write_list(f, &self.items)?;

        if let Some(from) = &self.from {
            write!(f, " FROM {}", from)?;
        }
        if let Some(where_clause) = &self.where_clause {
            write!(f, " WHERE {}", where_clause)?;
        }
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY ")?;
            write_list(f, &self.group_by)?;
        }
        if let Some(having) = &self.having {
            write!(f, " HAVING {}", having)?;
        }
        if !self.order_by.is_empty() {
            write!(f, " ORDER BY ")?;
            write_list(f, &self.order_by)?;
        }
        if let Some(limit) = &self.limit {
            match limit.offset {
                Some(offset) => write!(f, " LIMIT {} OFFSET {}", limit.limit, offset)?,
                None => write!(f, " LIMIT {}", limit.limit)?,
            }
        }
        if let Some(locking) = &self.locking {
            match locking.mode {
                LockMode::ShareLegacy => write!(f, " LOCK IN SHARE MODE")?,
                LockMode::Update => write!(f, " FOR UPDATE")?,
                LockMode::Share => write!(f, " FOR SHARE")?,
            }
            if !matches!(locking.mode, LockMode::ShareLegacy) {
                if !locking.of.is_empty() {
                    let names: Vec<String> =
                        locking.of.iter().map(|n| n.to_string()).collect();
                    write!(f, " OF {}", names.join(", "))?;
                }
                match locking.wait {
                    LockWait::Wait => {}
                    LockWait::Nowait => write!(f, " NOWAIT")?,
                    LockWait::SkipLocked => write!(f, " SKIP LOCKED")?,
                }
            }
        }

        for set_op in &self.set_ops {
            let op = match set_op.op {
                SetOperator::Union => "UNION",
                SetOperator::Intersect => "INTERSECT",
                SetOperator::Except => "EXCEPT",
            };
            write!(f, " {}{} {}", op, if set_op.all { " ALL" } else { "" }, set_op.query)?;
        }

        Ok(())
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
