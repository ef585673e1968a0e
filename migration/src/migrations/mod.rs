pub mod m202607010001_create_users;
pub mod m202607010002_create_check_ins;
