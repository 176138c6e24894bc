use std::collections::HashMap;

use lazy_static::lazy_static;

macro_rules! keywords {
    [$(
        $ident:ident
    )*] => {
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
        #[allow(non_camel_case_types, clippy::upper_case_acronyms)]
        pub enum Keyword {
            $($ident),*
        }

        impl Keyword {
            pub fn name(&self) -> &'static str {
                match self {
                    $(Keyword::$ident => stringify!($ident)),*
                }
            }
        }

        lazy_static! {
            static ref KEYWORDS: HashMap<&'static str, Keyword> = {
                let mut map = HashMap::new();
                $(map.insert(stringify!($ident), Keyword::$ident);)*
                map
            };
        }
    };
}

macro_rules! reserved {
    [$(
        $ident:ident
    )*] => {
        impl Keyword {
            /// Reserved words reject in bare identifier positions.
            pub const fn reserved(&self) -> bool {
                match self {
                    $(Keyword::$ident => true),*,
                    _ => false
                }
            }
        }
    };
}

impl Keyword {
    /// Case-insensitive lookup of an already-lexed identifier.
    pub fn from_ident(ident: &str) -> Option<Keyword> {
        KEYWORDS.get(ident.to_ascii_uppercase().as_str()).copied()
    }
}

keywords![
ACTION
ADD
AFTER
AGAINST
ALL
ALTER
ANALYZE
AND
ANY
AS
ASC
AT
AUTO_INCREMENT
BEFORE
BEGIN
BETWEEN
BIGINT
BINARY
BLOB
BOOL
BOOLEAN
BY
CALL
CASCADE
CASE
CHANGE
CHAR
CHARSET
CHECK
COLLATION
COLUMN
COLUMNS
COMMENT
COMMIT
COMMITTED
CONSTRAINT
CREATE
CROSS
CURRENT
DATABASE
DATABASES
DATE
DATETIME
DEC
DECIMAL
DECLARE
DEFAULT
DELETE
DESC
DESCRIBE
DETERMINISTIC
DISTINCT
DO
DOUBLE
DROP
DUPLICATE
EACH
ELSE
ELSEIF
END
ENGINE
ENGINES
ERRORS
EVENT
EVENTS
EVERY
EXCEPT
EXISTS
EXPLAIN
FALSE
FIELDS
FIRST
FLOAT
FLUSH
FOLLOWING
FOR
FOREIGN
FROM
FULL
FUNCTION
GLOBAL
GRANT
GRANTS
GROUP
HAVING
IDENTIFIED
IF
IGNORE
IN
INDEX
INDEXES
INNER
INOUT
INSERT
INT
INTEGER
INTERSECT
INTO
IS
ISOLATION
ITERATE
JOIN
KEY
KILL
LANGUAGE
LEAVE
LEFT
LEVEL
LIKE
LIMIT
LOCAL
LOCK
LOCKED
LOGS
LOOP
MATCH
MODE
MODIFY
NATURAL
NO
NOT
NOWAIT
NULL
NUMERIC
OF
OFFSET
ON
ONLY
OPTIMIZE
OPTION
OR
ORDER
OUT
OUTER
OVER
PARTITION
PRECEDING
PRIMARY
PRIVILEGES
PROCEDURE
PROCESSLIST
QUERY
RANGE
READ
RECURSIVE
REFERENCES
RENAME
REPEAT
REPEATABLE
REPLACE
RESTRICT
RETURN
RETURNS
REVOKE
RIGHT
ROLLBACK
ROW
ROWS
SCHEDULE
SELECT
SEPARATOR
SERIALIZABLE
SESSION
SET
SHARE
SHOW
SKIP
SMALLINT
SOME
START
STATUS
TABLE
TABLES
TEMPORARY
TEXT
THEN
TIME
TIMESTAMP
TINYINT
TO
TRANSACTION
TRIGGER
TRIGGERS
TRUE
UNBOUNDED
UNCOMMITTED
UNION
UNIQUE
UNLOCK
UNSIGNED
UNTIL
UPDATE
USE
USER
USING
VALUE
VALUES
VARCHAR
VARIABLES
VIEW
WARNINGS
WHEN
WHERE
WHILE
WITH
WORK
WRITE
];

reserved![
ALL
ALTER
AND
AS
ASC
BETWEEN
BY
CALL
CASE
CHECK
CREATE
CROSS
DECLARE
DEFAULT
DELETE
DESC
DESCRIBE
DISTINCT
DROP
ELSE
EXCEPT
EXISTS
EXPLAIN
FALSE
FOR
FOREIGN
FROM
FULL
GRANT
GROUP
HAVING
IF
IGNORE
IN
INNER
INSERT
INTERSECT
INTO
IS
JOIN
KILL
LEFT
LIKE
LIMIT
LOCK
MATCH
NATURAL
NOT
NULL
ON
OPTIMIZE
OR
ORDER
OUTER
OVER
PRIMARY
PROCEDURE
READ
REFERENCES
RENAME
REPLACE
RETURN
REVOKE
RIGHT
SELECT
SET
SHOW
TABLE
THEN
TO
TRUE
UNION
UNIQUE
UPDATE
USE
USING
VALUES
WHEN
WHERE
WHILE
WITH
];
