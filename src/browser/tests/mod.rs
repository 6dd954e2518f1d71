mod pool_tests;
