pub mod bounty_release;
