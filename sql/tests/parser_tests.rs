use sql::ast::*;
use sql::{parse_expression, parse_multiple, parse_multiple_spanned, parse_statement};

fn parse_select(input: &str) -> Select {
    match parse_statement(input).unwrap() {
        Statement::Select(select) => *select,
        other => panic!("expected SELECT, got {:?}", other),
    }
}

#[test]
fn test_select_minimal() {
    let select = parse_select("SELECT 1");
    assert_eq!(1, select.items.len());
    assert!(select.from.is_none());
    assert!(matches!(
        select.items[0].expr,
        Expression::Literal {
            value: Literal::Integer(1),
            ..
        }
    ));
}

#[test]
fn test_select_null_and_arithmetic() {
    parse_select("SELECT NULL");
    let select = parse_select("SELECT 1+NULL");
    assert!(matches!(
        select.items[0].expr,
        Expression::BinaryOp {
            op: BinaryOperator::Plus,
            ..
        }
    ));
}

#[test]
fn test_select_clause_order() {
    let select = parse_select(
        "SELECT a, COUNT(*) AS n FROM t WHERE a > 1 GROUP BY a HAVING n > 2 \
         ORDER BY n DESC LIMIT 10",
    );
    assert_eq!(2, select.items.len());
    assert_eq!(Some("n".to_string()), select.items[1].alias);
    assert!(select.where_clause.is_some());
    assert_eq!(1, select.group_by.len());
    assert!(select.having.is_some());
    assert_eq!(1, select.order_by.len());
    assert!(!select.order_by[0].asc);
    assert_eq!(Some(Limit { limit: 10, offset: None }), select.limit);
}

#[test]
fn test_limit_comma_form_swaps_offset() {
    let select = parse_select("SELECT a FROM t LIMIT 5, 7");
    assert_eq!(
        Some(Limit {
            limit: 7,
            offset: Some(5)
        }),
        select.limit
    );

    let select = parse_select("SELECT a FROM t LIMIT 7 OFFSET 5");
    assert_eq!(
        Some(Limit {
            limit: 7,
            offset: Some(5)
        }),
        select.limit
    );
}

#[test]
fn test_select_distinct_wildcard() {
    let select = parse_select("SELECT DISTINCT * FROM t");
    assert!(select.distinct);
    assert!(matches!(
        select.items[0].expr,
        Expression::Wildcard { table: None, .. }
    ));

    let select = parse_select("SELECT t.* FROM t");
    assert!(matches!(
        &select.items[0].expr,
        Expression::Wildcard { table: Some(t), .. } if t == "t"
    ));
}

#[test]
fn test_joins_left_associative() {
    let select = parse_select("SELECT * FROM a JOIN b ON a.x = b.x LEFT OUTER JOIN c USING (x)");
    let from = select.from.unwrap();
    match from {
        TableReference::Join {
            left,
            join_type: JoinType::Left,
            condition: JoinCondition::Using(columns),
            ..
        } => {
            assert_eq!(vec!["x".to_string()], columns);
            assert!(matches!(
                *left,
                TableReference::Join {
                    join_type: JoinType::Inner,
                    condition: JoinCondition::On(_),
                    ..
                }
            ));
        }
        other => panic!("unexpected from: {:?}", other),
    }
}

#[test]
fn test_natural_join_rejects_condition() {
    parse_statement("SELECT * FROM a NATURAL JOIN b").unwrap();
    assert!(parse_statement("SELECT * FROM a NATURAL JOIN b ON a.x = b.x").is_err());
    assert!(parse_statement("SELECT * FROM a NATURAL LEFT JOIN b USING (x)").is_err());
}

#[test]
fn test_cte_chain() {
    let select = parse_select(
        "WITH RECURSIVE cte1 (n) AS (SELECT 1), cte2 AS (SELECT n FROM cte1) \
         SELECT * FROM cte2",
    );
    let with = select.with.unwrap();
    assert!(with.recursive);
    assert_eq!(2, with.ctes.len());
    assert_eq!("cte1", with.ctes[0].name);
    assert_eq!(vec!["n".to_string()], with.ctes[0].columns);
}

#[test]
fn test_set_operations() {
    let select = parse_select("SELECT a FROM t UNION ALL SELECT b FROM u EXCEPT SELECT c FROM v");
    assert_eq!(2, select.set_ops.len());
    assert_eq!(SetOperator::Union, select.set_ops[0].op);
    assert!(select.set_ops[0].all);
    assert_eq!(SetOperator::Except, select.set_ops[1].op);
    assert!(!select.set_ops[1].all);
}

#[test]
fn test_locking_clauses() {
    let select = parse_select("SELECT * FROM t FOR UPDATE OF t NOWAIT");
    let locking = select.locking.unwrap();
    assert_eq!(LockMode::Update, locking.mode);
    assert_eq!(1, locking.of.len());
    assert_eq!(LockWait::Nowait, locking.wait);

    let select = parse_select("SELECT * FROM t FOR SHARE SKIP LOCKED");
    assert_eq!(LockWait::SkipLocked, select.locking.unwrap().wait);

    let select = parse_select("SELECT * FROM t LOCK IN SHARE MODE");
    assert_eq!(LockMode::ShareLegacy, select.locking.unwrap().mode);
}

#[test]
fn test_window_function_full_frame() {
    let select = parse_select(
        "SELECT SUM(x) OVER (PARTITION BY g ORDER BY t ROWS BETWEEN 2 PRECEDING AND CURRENT ROW) \
         FROM t",
    );
    match &select.items[0].expr {
        Expression::WindowFunction { window, .. } => {
            assert_eq!(1, window.partition_by.len());
            assert_eq!(1, window.order_by.len());
            let frame = window.frame.as_ref().unwrap();
            assert_eq!(FrameUnits::Rows, frame.units);
            assert_eq!(FrameBound::Preceding(2), frame.start);
            assert_eq!(FrameBound::CurrentRow, frame.end);
        }
        other => panic!("unexpected expr: {:?}", other),
    }
}

#[test]
fn test_window_bare_bound_defaults_to_current_row() {
    let select = parse_select("SELECT SUM(x) OVER (RANGE UNBOUNDED PRECEDING) FROM t");
    match &select.items[0].expr {
        Expression::WindowFunction { window, .. } => {
            let frame = window.frame.as_ref().unwrap();
            assert_eq!(FrameBound::UnboundedPreceding, frame.start);
            assert_eq!(FrameBound::CurrentRow, frame.end);
        }
        other => panic!("unexpected expr: {:?}", other),
    }
}

#[test]
fn test_case_forms() {
    // searched
    let select = parse_select("SELECT CASE WHEN 1 THEN 1 END");
    assert!(matches!(
        &select.items[0].expr,
        Expression::Case { operand: None, branches, .. } if branches.len() == 1
    ));

    // simple
    let select = parse_select("SELECT CASE x WHEN 1 THEN 'a' ELSE 'b' END");
    assert!(matches!(
        &select.items[0].expr,
        Expression::Case {
            operand: Some(_),
            else_branch: Some(_),
            ..
        }
    ));

    // CASE with no WHEN is a parse error
    assert!(parse_statement("SELECT CASE END").is_err());
}

#[test]
fn test_in_between_like_negated() {
    let select = parse_select("SELECT * FROM t WHERE a NOT IN (1, 2) AND b NOT BETWEEN 1 AND 5 AND c NOT LIKE 'x%'");
    let where_clause = select.where_clause.unwrap();
    let rendered = where_clause.to_string();
    assert!(rendered.contains("NOT IN"));
    assert!(rendered.contains("NOT BETWEEN"));
    assert!(rendered.contains("NOT LIKE"));
}

#[test]
fn test_in_subquery_and_exists() {
    let select = parse_select("SELECT * FROM t WHERE a IN (SELECT b FROM u) AND EXISTS (SELECT 1)");
    let rendered = select.where_clause.unwrap().to_string();
    assert!(rendered.contains("IN (SELECT"));
    assert!(rendered.contains("EXISTS (SELECT"));
}

#[test]
fn test_quantified_comparison() {
    let select = parse_select("SELECT * FROM t WHERE a > ALL (SELECT b FROM u)");
    assert!(matches!(
        select.where_clause.unwrap(),
        Expression::Quantified {
            op: BinaryOperator::Gt,
            quantifier: Quantifier::All,
            ..
        }
    ));
}

#[test]
fn test_comparison_binds_tighter_than_and_or() {
    let expr = parse_expression("a = 1 OR b = 2 AND c = 3").unwrap();
    // OR at the top, AND beneath on the right
    match expr {
        Expression::BinaryOp {
            op: BinaryOperator::Or,
            right,
            ..
        } => assert!(matches!(
            *right,
            Expression::BinaryOp {
                op: BinaryOperator::And,
                ..
            }
        )),
        other => panic!("unexpected expr: {:?}", other),
    }
}

#[test]
fn test_system_variables_desugar() {
    let expr = parse_expression("@@global.max_connections").unwrap();
    assert!(matches!(
        expr,
        Expression::SystemVariable {
            scope: VariableScope::Global,
            ref name,
            ..
        } if name == "max_connections"
    ));

    let expr = parse_expression("@@autocommit").unwrap();
    assert!(matches!(
        expr,
        Expression::SystemVariable {
            scope: VariableScope::Session,
            ..
        }
    ));
}

#[test]
fn test_json_operators_desugar() {
    let expr = parse_expression("doc -> '$.a'").unwrap();
    match expr {
        Expression::FunctionCall { name, args, .. } => {
            assert_eq!("JSON_EXTRACT", name);
            assert_eq!(2, args.len());
        }
        other => panic!("unexpected expr: {:?}", other),
    }

    let expr = parse_expression("doc ->> '$.a'").unwrap();
    match expr {
        Expression::FunctionCall { name, args, .. } => {
            assert_eq!("JSON_UNQUOTE", name);
            assert!(matches!(
                &args[0],
                Expression::FunctionCall { name, .. } if name == "JSON_EXTRACT"
            ));
        }
        other => panic!("unexpected expr: {:?}", other),
    }
}

#[test]
fn test_match_against() {
    let expr = parse_expression("MATCH (title, body) AGAINST ('rust' IN BOOLEAN MODE)").unwrap();
    assert!(matches!(
        expr,
        Expression::MatchAgainst {
            mode: Some(MatchMode::Boolean),
            ..
        }
    ));
}

#[test]
fn test_group_concat_extras() {
    let expr = parse_expression("GROUP_CONCAT(DISTINCT name ORDER BY name SEPARATOR ', ')").unwrap();
    match expr {
        Expression::FunctionCall {
            distinct,
            order_by,
            separator,
            ..
        } => {
            assert!(distinct);
            assert_eq!(1, order_by.len());
            assert_eq!(Some(", ".to_string()), separator);
        }
        other => panic!("unexpected expr: {:?}", other),
    }
}

#[test]
fn test_keyword_admitted_as_identifier() {
    // STATUS and COMMENT are keywords but valid names
    let select = parse_select("SELECT status FROM events");
    assert!(matches!(
        &select.items[0].expr,
        Expression::ColumnRef { column, .. } if column == "status"
    ));
    parse_statement("SELECT comment FROM t").unwrap();
    // reserved words are not
    assert!(parse_statement("SELECT select FROM t").is_err());
}

#[test]
fn test_insert_values_and_on_duplicate() {
    let statement = parse_statement(
        "INSERT INTO t (id, name) VALUES (1, 'a'), (2, 'b') ON DUPLICATE KEY UPDATE name = 'c'",
    )
    .unwrap();
    match statement {
        Statement::Insert(insert) => {
            assert_eq!(vec!["id".to_string(), "name".to_string()], insert.columns);
            match insert.source {
                InsertSource::Values(rows) => assert_eq!(2, rows.len()),
                other => panic!("unexpected source: {:?}", other),
            }
            assert_eq!(1, insert.on_duplicate.len());
        }
        other => panic!("expected INSERT, got {:?}", other),
    }
}

#[test]
fn test_insert_from_select() {
    let statement = parse_statement("INSERT INTO t SELECT * FROM u").unwrap();
    assert!(matches!(
        statement,
        Statement::Insert(Insert {
            source: InsertSource::Select(_),
            ..
        })
    ));
}

#[test]
fn test_update_and_delete() {
    let statement = parse_statement("UPDATE t SET a = 1, b = b + 1 WHERE id = 3 LIMIT 1").unwrap();
    match statement {
        Statement::Update(update) => {
            assert_eq!(2, update.assignments.len());
            assert!(update.where_clause.is_some());
            assert_eq!(Some(1), update.limit);
        }
        other => panic!("expected UPDATE, got {:?}", other),
    }

    let statement = parse_statement("DELETE FROM t WHERE id = 3 ORDER BY id LIMIT 2").unwrap();
    assert!(matches!(
        statement,
        Statement::Delete(Delete { limit: Some(2), .. })
    ));
}

#[test]
fn test_create_table_with_constraints() {
    let statement = parse_statement(
        "CREATE TABLE IF NOT EXISTS t (\
           id INT PRIMARY KEY AUTO_INCREMENT, \
           name VARCHAR(32) NOT NULL DEFAULT 'x' COMMENT 'the name', \
           parent INT, \
           UNIQUE KEY uq_name (name), \
           FOREIGN KEY fk_parent (parent) REFERENCES t (id) ON UPDATE CASCADE ON DELETE SET NULL, \
           CHECK (id > 0)\
         ) ENGINE = InnoDB COMMENT = 'demo'",
    )
    .unwrap();

    match statement {
        Statement::CreateTable(create) => {
            assert!(create.if_not_exists);
            assert_eq!(3, create.columns.len());
            assert!(create.columns[0].primary_key);
            assert!(create.columns[0].auto_increment);
            assert_eq!(Some(false), create.columns[1].nullable);
            assert_eq!(Some("the name".to_string()), create.columns[1].comment);
            assert_eq!(3, create.constraints.len());
            match &create.constraints[1] {
                TableConstraint::ForeignKey {
                    on_delete,
                    on_update,
                    ..
                } => {
                    // ON UPDATE / ON DELETE accepted in either order
                    assert_eq!(ReferentialAction::SetNull, *on_delete);
                    assert_eq!(ReferentialAction::Cascade, *on_update);
                }
                other => panic!("unexpected constraint: {:?}", other),
            }
            assert_eq!(Some("InnoDB".to_string()), create.engine);
        }
        other => panic!("expected CREATE TABLE, got {:?}", other),
    }
}

#[test]
fn test_foreign_key_defaults_and_duplicates() {
    let statement = parse_statement(
        "CREATE TABLE t (a INT, FOREIGN KEY (a) REFERENCES u (id))",
    )
    .unwrap();
    match statement {
        Statement::CreateTable(create) => match &create.constraints[0] {
            TableConstraint::ForeignKey {
                on_delete,
                on_update,
                ..
            } => {
                assert_eq!(ReferentialAction::Restrict, *on_delete);
                assert_eq!(ReferentialAction::Restrict, *on_update);
            }
            other => panic!("unexpected constraint: {:?}", other),
        },
        other => panic!("expected CREATE TABLE, got {:?}", other),
    }

    assert!(parse_statement(
        "CREATE TABLE t (a INT, FOREIGN KEY (a) REFERENCES u (id) \
         ON DELETE CASCADE ON DELETE RESTRICT)"
    )
    .is_err());
}

#[test]
fn test_alter_table_actions() {
    let statement = parse_statement(
        "ALTER TABLE t ADD COLUMN b INT AFTER a, DROP COLUMN c, MODIFY COLUMN d VARCHAR(10), \
         RENAME COLUMN e TO f, DROP PRIMARY KEY",
    )
    .unwrap();
    match statement {
        Statement::AlterTable(alter) => {
            assert_eq!(5, alter.actions.len());
            assert!(matches!(
                &alter.actions[0],
                AlterAction::AddColumn {
                    after: Some(a),
                    ..
                } if a == "a"
            ));
            assert!(matches!(alter.actions[4], AlterAction::DropPrimaryKey));
        }
        other => panic!("expected ALTER TABLE, got {:?}", other),
    }
}

#[test]
fn test_create_drop_misc_objects() {
    parse_statement("CREATE DATABASE IF NOT EXISTS shop").unwrap();
    parse_statement("CREATE UNIQUE INDEX idx_name ON t (a, b)").unwrap();
    parse_statement("CREATE OR REPLACE VIEW v AS SELECT a FROM t").unwrap();
    parse_statement("CREATE USER 'app' IDENTIFIED BY 'secret'").unwrap();
    parse_statement("DROP TABLE IF EXISTS t").unwrap();
    parse_statement("DROP INDEX idx_name ON t").unwrap();
    parse_statement("DROP EVENT nightly").unwrap();
}

#[test]
fn test_create_procedure_with_control_flow() {
    let statement = parse_statement(
        "CREATE PROCEDURE bump (IN delta INT, OUT total INT) NOT DETERMINISTIC \
         BEGIN \
           DECLARE i INT DEFAULT 0; \
           WHILE i < delta DO \
             SET i = i + 1; \
           END WHILE; \
           IF i > 10 THEN SELECT i; ELSE SELECT 0; END IF; \
           RETURN i; \
         END",
    )
    .unwrap();

    match statement {
        Statement::CreateProcedure(routine) => {
            assert_eq!(2, routine.params.len());
            assert_eq!(ParamMode::Out, routine.params[1].mode);
            assert_eq!(Some(false), routine.deterministic);
            match *routine.body {
                Statement::Block { ref body, .. } => assert_eq!(4, body.len()),
                ref other => panic!("unexpected body: {:?}", other),
            }
        }
        other => panic!("expected CREATE PROCEDURE, got {:?}", other),
    }
}

#[test]
fn test_create_function_returns() {
    let statement = parse_statement(
        "CREATE FUNCTION double_it (x INT) RETURNS INT DETERMINISTIC RETURN x * 2",
    )
    .unwrap();
    match statement {
        Statement::CreateFunction(routine) => {
            assert_eq!(Some(DataType::Int), routine.returns);
            assert_eq!(Some(true), routine.deterministic);
            assert!(matches!(*routine.body, Statement::Return { .. }));
        }
        other => panic!("expected CREATE FUNCTION, got {:?}", other),
    }
}

#[test]
fn test_create_trigger_and_event() {
    let statement = parse_statement(
        "CREATE TRIGGER audit_ins AFTER INSERT ON t FOR EACH ROW \
         INSERT INTO audit VALUES (1)",
    )
    .unwrap();
    assert!(matches!(
        statement,
        Statement::CreateTrigger(CreateTrigger {
            timing: TriggerTiming::After,
            event: TriggerEvent::Insert,
            ..
        })
    ));

    let statement =
        parse_statement("CREATE EVENT nightly ON SCHEDULE EVERY 1 day DO DELETE FROM log").unwrap();
    assert!(matches!(
        statement,
        Statement::CreateEvent(CreateEvent {
            schedule: EventSchedule::Every { interval: 1, .. },
            ..
        })
    ));
}

#[test]
fn test_labeled_loops() {
    let statement = parse_statement(
        "again: LOOP ITERATE again; LEAVE again; END LOOP",
    )
    .unwrap();
    match statement {
        Statement::Loop { label, body, .. } => {
            assert_eq!(Some("again".to_string()), label);
            assert_eq!(2, body.len());
        }
        other => panic!("expected LOOP, got {:?}", other),
    }

    let statement =
        parse_statement("REPEAT SET x = x + 1; UNTIL x > 3 END REPEAT").unwrap();
    assert!(matches!(statement, Statement::Repeat { .. }));
}

#[test]
fn test_show_forms() {
    assert!(matches!(
        parse_statement("SHOW DATABASES").unwrap(),
        Statement::Show(Show::Databases { like: None })
    ));
    assert!(matches!(
        parse_statement("SHOW TABLES FROM shop LIKE 't%'").unwrap(),
        Statement::Show(Show::Tables {
            database: Some(_),
            like: Some(_)
        })
    ));
    assert!(matches!(
        parse_statement("SHOW FULL COLUMNS FROM t").unwrap(),
        Statement::Show(Show::Columns { .. })
    ));
    assert!(matches!(
        parse_statement("SHOW GLOBAL VARIABLES LIKE 'max%'").unwrap(),
        Statement::Show(Show::Variables {
            scope: Some(VariableScope::Global),
            like: Some(_)
        })
    ));
    assert!(matches!(
        parse_statement("SHOW CREATE TABLE t").unwrap(),
        Statement::Show(Show::CreateTable { .. })
    ));
    assert!(matches!(
        parse_statement("SHOW PROCESSLIST").unwrap(),
        Statement::Show(Show::Processlist)
    ));
    assert!(matches!(
        parse_statement("SHOW GRANTS FOR 'app'").unwrap(),
        Statement::Show(Show::Grants { user: Some(_) })
    ));
}

#[test]
fn test_transactions() {
    assert!(matches!(
        parse_statement("BEGIN").unwrap(),
        Statement::StartTransaction { .. }
    ));
    assert!(matches!(
        parse_statement("START TRANSACTION").unwrap(),
        Statement::StartTransaction { .. }
    ));
    assert!(matches!(
        parse_statement("COMMIT WORK").unwrap(),
        Statement::Commit { .. }
    ));
    assert!(matches!(
        parse_statement("ROLLBACK").unwrap(),
        Statement::Rollback { .. }
    ));
}

#[test]
fn test_set_forms() {
    let statement = parse_statement("SET GLOBAL max_connections = 100, autocommit = 1").unwrap();
    match statement {
        Statement::Set(SetStatement::Variables { assignments, .. }) => {
            assert_eq!(2, assignments.len());
            assert_eq!(Some(VariableScope::Global), assignments[0].scope);
            assert_eq!(None, assignments[1].scope);
        }
        other => panic!("expected SET, got {:?}", other),
    }

    assert!(matches!(
        parse_statement("SET NAMES utf8mb4").unwrap(),
        Statement::Set(SetStatement::Names { .. })
    ));

    let statement =
        parse_statement("SET SESSION TRANSACTION ISOLATION LEVEL REPEATABLE READ").unwrap();
    assert!(matches!(
        statement,
        Statement::Set(SetStatement::TransactionIsolation {
            scope: Some(VariableScope::Session),
            level: IsolationLevel::RepeatableRead,
            ..
        })
    ));

    let statement = parse_statement("SET @@global.sql_mode = 'STRICT'").unwrap();
    match statement {
        Statement::Set(SetStatement::Variables { assignments, .. }) => {
            assert_eq!(Some(VariableScope::Global), assignments[0].scope);
            assert_eq!("sql_mode", assignments[0].name);
        }
        other => panic!("expected SET, got {:?}", other),
    }
}

#[test]
fn test_kill_grant_revoke_call() {
    assert!(matches!(
        parse_statement("KILL 42").unwrap(),
        Statement::Kill {
            connection_id: 42,
            query_only: false,
            ..
        }
    ));
    assert!(matches!(
        parse_statement("KILL QUERY 42").unwrap(),
        Statement::Kill {
            query_only: true,
            ..
        }
    ));

    let statement = parse_statement("GRANT SELECT, INSERT ON shop.* TO 'app' WITH GRANT OPTION").unwrap();
    match statement {
        Statement::Grant(grant) => {
            assert_eq!(vec!["SELECT".to_string(), "INSERT".to_string()], grant.privileges);
            assert_eq!("shop.*", grant.object.to_string());
            assert!(grant.with_grant_option);
        }
        other => panic!("expected GRANT, got {:?}", other),
    }

    assert!(matches!(
        parse_statement("REVOKE ALL PRIVILEGES ON *.* FROM 'app'").unwrap(),
        Statement::Revoke(_)
    ));

    let statement = parse_statement("CALL refresh_stats(1, 'daily')").unwrap();
    assert!(matches!(
        statement,
        Statement::Call { ref args, .. } if args.len() == 2
    ));
}

#[test]
fn test_explain_analyze_flush_lock_optimize() {
    assert!(matches!(
        parse_statement("EXPLAIN SELECT * FROM t").unwrap(),
        Statement::Explain { analyze: false, .. }
    ));
    assert!(matches!(
        parse_statement("EXPLAIN ANALYZE SELECT * FROM t").unwrap(),
        Statement::Explain { analyze: true, .. }
    ));
    assert!(matches!(
        parse_statement("EXPLAIN t").unwrap(),
        Statement::Describe { .. }
    ));
    assert!(matches!(
        parse_statement("ANALYZE TABLE t, u").unwrap(),
        Statement::AnalyzeTable { ref tables, .. } if tables.len() == 2
    ));
    assert!(matches!(
        parse_statement("FLUSH PRIVILEGES, LOGS").unwrap(),
        Statement::Flush { ref targets, .. } if targets.len() == 2
    ));
    assert!(matches!(
        parse_statement("LOCK TABLES t READ, u WRITE").unwrap(),
        Statement::LockTables { ref tables, .. } if tables.len() == 2
    ));
    assert!(matches!(
        parse_statement("UNLOCK TABLES").unwrap(),
        Statement::UnlockTables { .. }
    ));
    assert!(matches!(
        parse_statement("OPTIMIZE TABLE t").unwrap(),
        Statement::Optimize { .. }
    ));
}

#[test]
fn test_use_and_describe() {
    assert!(matches!(
        parse_statement("USE shop").unwrap(),
        Statement::Use { ref database, .. } if database == "shop"
    ));
    assert!(matches!(
        parse_statement("DESCRIBE t").unwrap(),
        Statement::Describe { column: None, .. }
    ));
    assert!(matches!(
        parse_statement("DESC t name").unwrap(),
        Statement::Describe {
            column: Some(_),
            ..
        }
    ));
}

#[test]
fn test_error_cites_position() {
    let err = parse_statement("SELEC 1").unwrap_err();
    assert!(err.message.contains("SELEC"), "message: {}", err.message);
    assert_eq!(1, err.line);
    assert_eq!(1, err.column);

    let err = parse_statement("SELECT a FROM").unwrap_err();
    assert_eq!(1, err.line);
    assert!(err.column > 1);
}

#[test]
fn test_multiple_statements_with_spans() {
    let input = "SELECT 1; INSERT INTO t VALUES (1); ; SELECT 2";
    let statements = parse_multiple_spanned(input).unwrap();
    assert_eq!(3, statements.len());
    assert!(input[statements[0].1.clone()].starts_with("SELECT 1"));
    assert!(input[statements[1].1.clone()].starts_with("INSERT INTO t"));
    assert!(input[statements[2].1.clone()].starts_with("SELECT 2"));

    assert!(parse_multiple("").unwrap().is_empty());
    assert!(parse_multiple("   \n\t").unwrap().is_empty());
}

#[test]
fn test_select_round_trip_is_stable() {
    let inputs = [
        "SELECT 1",
        "SELECT DISTINCT a, b AS x FROM t WHERE a > 1 AND b NOT IN (1, 2) \
         GROUP BY a HAVING COUNT(*) > 1 ORDER BY a DESC LIMIT 7 OFFSET 5",
        "SELECT a FROM t JOIN u ON t.id = u.id LEFT JOIN v USING (id)",
        "WITH c AS (SELECT 1) SELECT * FROM c UNION ALL SELECT 2",
        "SELECT CASE WHEN a IS NULL THEN 0 ELSE a END FROM t",
        "SELECT SUM(x) OVER (PARTITION BY g ORDER BY t ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW) FROM t",
        "SELECT * FROM t WHERE MATCH (a) AGAINST ('x' IN BOOLEAN MODE) FOR UPDATE NOWAIT",
    ];

    for input in inputs {
        let first = match parse_statement(input).unwrap() {
            Statement::Select(select) => select,
            other => panic!("expected SELECT, got {:?}", other),
        };
        let printed = first.to_string();
        let second = match parse_statement(&printed).unwrap() {
            Statement::Select(select) => select,
            other => panic!("expected SELECT, got {:?}", other),
        };
        assert_eq!(printed, second.to_string(), "unstable: {}", input);
    }
}

#[test]
fn test_trailing_garbage_rejected() {
    assert!(parse_statement("SELECT 1 garbage extra").is_err());
    assert!(parse_statement("SELECT 1; SELECT 2").is_err());
}
